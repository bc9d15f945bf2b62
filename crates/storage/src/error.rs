/// All errors that can be returned by a `DocumentStore` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// No document with this id exists in the seed set or the created table.
    #[error("document not found: {id}")]
    NotFound { id: String },

    /// A document with this id already exists.
    #[error("document already exists: {id}")]
    AlreadyExists { id: String },

    /// The id belongs to the generated seed set, which is never mutated.
    #[error("document {id} belongs to the read-only seed set")]
    ReadOnly { id: String },

    /// Optimistic concurrency conflict: the stored version no longer matches
    /// the version the caller read.
    #[error("concurrent conflict on document {id}: expected version {expected_version}, found {actual_version}")]
    ConcurrentConflict {
        id: String,
        expected_version: u64,
        actual_version: u64,
    },

    /// A backend-specific storage error.
    #[error("storage backend error: {0}")]
    Backend(String),
}
