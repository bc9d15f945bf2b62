use findoc_core::{EditError, ValidationError, WorkflowError, WorkflowViolation};
use findoc_storage::StorageError;

use crate::simulator::SimulatedTransportError;

/// Every failure a caller of [`FinanceApi`](crate::FinanceApi) can observe.
///
/// None of these are fatal. Only `Transport` is worth retrying; the others
/// fail the same way until the input or the document changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("document not found: {id}")]
    NotFound { id: String },

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Transport(#[from] SimulatedTransportError),

    #[error(transparent)]
    Storage(StorageError),
}

impl ApiError {
    /// HTTP-like status: 404 not found, 422 validation or workflow, the
    /// simulated code for transport failures, 500 for storage faults.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) | ApiError::Workflow(_) => 422,
            ApiError::NotFound { .. } => 404,
            ApiError::Transport(err) => err.status,
            ApiError::Storage(_) => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { id } => ApiError::NotFound { id },
            StorageError::ReadOnly { id } => {
                ApiError::Workflow(WorkflowError::new(id, WorkflowViolation::ReadOnly))
            }
            other => ApiError::Storage(other),
        }
    }
}

impl From<EditError> for ApiError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::Workflow(err) => ApiError::Workflow(err),
            EditError::Validation(err) => ApiError::Validation(err),
        }
    }
}
