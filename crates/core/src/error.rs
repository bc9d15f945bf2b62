//! Error types raised by the query engine and the workflow state machine.

use crate::types::DocumentStatus;

/// Malformed or disallowed caller input.
///
/// Raised before any document is read, so a validation failure never
/// leaves a partially applied query or mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed filter '{expr}': expected field:operator:value")]
    MalformedFilter { expr: String },

    #[error("unknown filter field '{field}'")]
    UnknownFilterField { field: String },

    #[error("unsupported filter operator '{operator}' on field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("malformed sort '{expr}': expected field[:direction]")]
    MalformedSort { expr: String },

    #[error("unknown sort field '{field}'")]
    UnknownSortField { field: String },

    #[error("invalid sort direction '{direction}' for field '{field}': expected asc or desc")]
    InvalidSortDirection { field: String, direction: String },

    #[error("Invalid cursor format")]
    InvalidCursorFormat { cursor: String },

    #[error("Invalid cursor value")]
    InvalidCursorValue { cursor: String },

    #[error("unknown status '{value}'")]
    UnknownStatus { value: String },

    #[error("invalid line item: {reason}")]
    InvalidLineItem { reason: String },

    #[error("invalid document input: {reason}")]
    InvalidInput { reason: String },
}

/// An operation that is not legal from the document's current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("document '{id}': {violation}")]
pub struct WorkflowError {
    pub id: String,
    pub violation: WorkflowViolation,
}

impl WorkflowError {
    pub fn new(id: impl Into<String>, violation: WorkflowViolation) -> Self {
        WorkflowError {
            id: id.into(),
            violation,
        }
    }
}

/// Failure of a line-item edit: the document is not editable, or the new
/// lines are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// What made a workflow operation illegal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowViolation {
    #[error(
        "cannot move from {current} to {attempted}; legal next states: {}",
        list_states(.legal)
    )]
    IllegalTransition {
        current: DocumentStatus,
        attempted: DocumentStatus,
        legal: Vec<DocumentStatus>,
    },

    #[error("{current} is a terminal state; there is no next state")]
    Terminal { current: DocumentStatus },

    #[error("{operation} requires status {}, but document is {current}", list_states(.required))]
    WrongState {
        operation: &'static str,
        current: DocumentStatus,
        required: Vec<DocumentStatus>,
    },

    #[error("document is {current}; only {initial} documents can be edited or deleted")]
    NotEditable {
        current: DocumentStatus,
        initial: DocumentStatus,
    },

    #[error("generated documents are read-only")]
    ReadOnly,
}

/// Render a state list for error messages; an empty list reads "none".
pub(crate) fn list_states(states: &[DocumentStatus]) -> String {
    if states.is_empty() {
        return "none".to_string();
    }
    states
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
