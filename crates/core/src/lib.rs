//! findoc-core: finance document model and the pure logic behind the
//! simulated documents API.
//!
//! Nothing in this crate performs I/O or sleeps; every operation is a plain
//! function over owned or borrowed [`Document`] values.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`generate()`] -- seeded, reproducible document sets
//! - [`Query`] -- validated filter + sort expression pair
//! - [`paginate()`] / [`Page`] -- base64 offset cursors
//! - [`WorkflowEngine`] / [`TransitionTable`] -- guarded status transitions
//! - [`ValidationError`] / [`WorkflowError`] -- the two caller-facing error kinds

pub mod cursor;
pub mod error;
pub mod generator;
pub mod query;
pub mod types;
pub mod workflow;

// ── Convenience re-exports ───────────────────────────────────────────

pub use cursor::{
    clamp_limit, decode_cursor, encode_cursor, paginate, paginate_from, Page, DEFAULT_LIMIT,
    MAX_LIMIT, MIN_LIMIT,
};
pub use error::{EditError, ValidationError, WorkflowError, WorkflowViolation};
pub use generator::{generate, generate_with};
pub use query::{
    DocumentField, FieldValue, FilterOperator, FilterSpec, FilterValue, Query, SortDirection,
    SortSpec,
};
pub use types::{
    Currency, Document, DocumentInput, DocumentPatch, DocumentStatus, DocumentType, LineItem,
    LineItemInput, Money, TransitionRecord,
};
pub use workflow::{approver_for, TableError, TransitionTable, WorkflowEngine, WorkflowModel};
