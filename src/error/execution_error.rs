use thiserror::Error;

/// Errors raised while dispatching a callable node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Argument validation failed for {node_id}: {}", problems.join("; "))]
    ArgValidation {
        node_id: String,
        problems: Vec<String>,
    },
    #[error("Node {0} is not callable")]
    CallableRequired(String),
    #[error("No {kind} callable registered as '{function_name}' (node {node_id})")]
    CallableNotRegistered {
        node_id: String,
        function_name: String,
        kind: &'static str,
    },
    #[error("Callable failed at {node_id}: {message}")]
    CallableFailure { node_id: String, message: String },
    #[error("Execution of {node_id} timed out after {timeout_ms}ms")]
    Timeout { node_id: String, timeout_ms: u64 },
    #[error("Execution of {0} was cancelled")]
    Cancelled(String),
}

impl ExecutionError {
    /// Whether the error happened after the callable was actually invoked,
    /// i.e. whether the attempt counts against the workflow record.
    pub fn is_recorded_failure(&self) -> bool {
        matches!(
            self,
            ExecutionError::CallableFailure { .. }
                | ExecutionError::Timeout { .. }
                | ExecutionError::Cancelled(_)
        )
    }
}
