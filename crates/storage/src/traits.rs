use async_trait::async_trait;
use findoc_core::Document;

use crate::error::StorageError;

/// The storage trait behind the documents API.
///
/// A `DocumentStore` holds two populations: a read-only seed set produced by
/// the generator at construction, and a mutable table of documents created
/// through the API.
///
/// ## Snapshot Semantics
///
/// All mutating operations take `&mut Self::Snapshot`, a type representing an
/// in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()`: start a transaction, returns a `Snapshot`
/// 2. Call mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)`: apply and consume the transaction
///    OR `abort_snapshot(snapshot)`: discard and consume the transaction
///
/// If a `Snapshot` is dropped without committing, its writes MUST be
/// discarded. Writes made in a snapshot are visible to reads made through the
/// same snapshot and to nobody else until commit.
///
/// ## Serialization
///
/// A live snapshot holds the store's single write lock, so mutations are
/// serialized per store. Non-snapshot reads from the task holding a snapshot
/// would wait on that lock; read through the snapshot instead.
///
/// ## OCC Conflict Detection
///
/// `update_document` and `delete_document` check that the stored version
/// equals `expected_version`, returning `StorageError::ConcurrentConflict`
/// otherwise. This catches callers acting on a stale read.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this storage backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Document operations (within snapshot) ─────────────────────────────────

    /// Read a document for modification.
    ///
    /// Returns `Err(StorageError::ReadOnly)` for seed documents and
    /// `Err(StorageError::NotFound)` for unknown ids.
    async fn get_document_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        id: &str,
    ) -> Result<Document, StorageError>;

    /// Insert a newly created document.
    ///
    /// Returns `Err(StorageError::AlreadyExists)` if the id is taken in
    /// either population.
    async fn insert_document(
        &self,
        snapshot: &mut Self::Snapshot,
        document: Document,
    ) -> Result<(), StorageError>;

    /// Replace a created document, conditional on its stored version.
    ///
    /// Returns the version now stored.
    async fn update_document(
        &self,
        snapshot: &mut Self::Snapshot,
        document: Document,
        expected_version: u64,
    ) -> Result<u64, StorageError>;

    /// Remove a created document, conditional on its stored version.
    async fn delete_document(
        &self,
        snapshot: &mut Self::Snapshot,
        id: &str,
        expected_version: u64,
    ) -> Result<(), StorageError>;

    // ── Query operations (outside snapshot) ───────────────────────────────────

    /// Read one committed document from either population.
    async fn get_document(&self, id: &str) -> Result<Document, StorageError>;

    /// The live committed collection: seed documents in generation order,
    /// then created documents in creation order.
    async fn list_documents(&self) -> Result<Vec<Document>, StorageError>;
}
