use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkflowError>;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("state conflict: {0}")]
    StateConflict(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("collaborator failure: {0}")]
    Collaborator(String),
}

impl WorkflowError {
    /// True for the precondition failures that callers are expected to
    /// handle (as opposed to infrastructure faults).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WorkflowError::Validation(_)
                | WorkflowError::NotFound(_)
                | WorkflowError::StateConflict(_)
        )
    }
}
