use thiserror::Error;

use crate::tracker::WorkflowStatus;

/// Contradictory trust-state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("Workflow {path} is not in quarantine (status: {status})")]
    NotInQuarantine {
        path: String,
        status: WorkflowStatus,
    },
    #[error("Workflow {0} is already golden")]
    AlreadyGolden(String),
    #[error("Workflow {path} is not golden (status: {status})")]
    NotGolden {
        path: String,
        status: WorkflowStatus,
    },
    #[error("No workflow record for {0}")]
    UnknownRecord(String),
    #[error("Workflow {0} has no pending approval")]
    NotPending(String),
    #[error("Approval service unavailable")]
    ServiceUnavailable,
}

/// Workflow record persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Record corrupted: {0}")]
    Corrupted(String),
}
