//! findoc-service: the simulated finance documents API.
//!
//! [`FinanceApi`] ties together the pure logic in `findoc-core`, a
//! [`DocumentStore`](findoc_storage::DocumentStore) and the
//! [`NetworkSimulator`]. Callers own one `FinanceApi` per session; there is no
//! global state.

pub mod api;
pub mod config;
pub mod error;
pub mod simulator;

pub use api::{FinanceApi, ListRequest};
pub use config::{
    ConfigError, DatasetConfig, NetworkConfig, PaginationConfig, ServiceConfig, WorkflowConfig,
};
pub use error::ApiError;
pub use simulator::{NetworkSimulator, SimulatedTransportError, TRANSPORT_FAILURES};
