use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use navshell_types::{CallableError, CallableKind};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ExecutionError, ShellError};
use crate::events::{emit, EventSender, ShellEvent};
use crate::schema::Node;
use crate::tracker::{StatusTracker, WorkflowRecord};

use super::args::validate_args;
use super::registry::{CallableRegistry, RegisteredCallable};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Output of one successful dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub node_id: String,
    pub output: Value,
    pub record: WorkflowRecord,
}

/// Runs callable nodes and records each attempt against the node's
/// workflow record.
pub struct Dispatcher {
    registry: Arc<CallableRegistry>,
    tracker: Arc<StatusTracker>,
    default_timeout: Duration,
    events: Option<EventSender>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CallableRegistry>, tracker: Arc<StatusTracker>) -> Self {
        Self {
            registry,
            tracker,
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            events: None,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn tracker(&self) -> &Arc<StatusTracker> {
        &self.tracker
    }

    pub fn registry(&self) -> &Arc<CallableRegistry> {
        &self.registry
    }

    /// Validate `args`, invoke the node's callable and record the attempt.
    ///
    /// Argument problems and missing registrations fail before anything is
    /// recorded. Once the callable has been invoked, success, failure and
    /// timeout are all counted.
    pub async fn execute(
        &self,
        node: &Node,
        args: Value,
        timeout: Option<Duration>,
    ) -> Result<DispatchOutcome, ShellError> {
        let binding = node
            .binding()
            .ok_or_else(|| ExecutionError::CallableRequired(node.id.clone()))?;

        validate_args(&node.id, &binding.args_schema, &args)?;

        let kind = CallableKind::from_async_flag(binding.is_async);
        let callable = self.registry.get(&binding.function_name, kind).ok_or_else(|| {
            ExecutionError::CallableNotRegistered {
                node_id: node.id.clone(),
                function_name: binding.function_name.clone(),
                kind: match kind {
                    CallableKind::Sync => "sync",
                    CallableKind::Async => "async",
                },
            }
        })?;

        let timeout = timeout.unwrap_or(self.default_timeout);
        emit(
            self.events.as_ref(),
            ShellEvent::ExecutionStarted {
                node_id: node.id.clone(),
                timestamp: Utc::now(),
            },
        );
        let started = Instant::now();
        let result = invoke(&node.id, callable, args, timeout).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        let success = result.is_ok();

        let record = self.tracker.record_execution(&node.id, success).await?;
        emit(
            self.events.as_ref(),
            ShellEvent::ExecutionFinished {
                node_id: node.id.clone(),
                success,
                duration_ms,
                timestamp: Utc::now(),
            },
        );

        match result {
            Ok(output) => {
                info!(node_id = %node.id, duration_ms, status = %record.status, "callable finished");
                Ok(DispatchOutcome {
                    node_id: node.id.clone(),
                    output,
                    record,
                })
            }
            Err(err) => {
                warn!(node_id = %node.id, duration_ms, error = %err, "callable failed");
                Err(err.into())
            }
        }
    }
}

async fn invoke(
    node_id: &str,
    callable: RegisteredCallable,
    args: Value,
    timeout: Duration,
) -> Result<Value, ExecutionError> {
    let timed_out = || ExecutionError::Timeout {
        node_id: node_id.to_string(),
        timeout_ms: timeout.as_millis() as u64,
    };
    let failed = |e: CallableError| ExecutionError::CallableFailure {
        node_id: node_id.to_string(),
        message: e.to_string(),
    };

    match callable {
        RegisteredCallable::Sync(callable) => {
            let task = tokio::task::spawn_blocking(move || callable.call(args));
            let abort = task.abort_handle();
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(result)) => result.map_err(failed),
                Ok(Err(join_err)) if join_err.is_panic() => Err(ExecutionError::CallableFailure {
                    node_id: node_id.to_string(),
                    message: "callable panicked".to_string(),
                }),
                Ok(Err(_)) => Err(ExecutionError::Cancelled(node_id.to_string())),
                Err(_) => {
                    // A blocking thread cannot be interrupted; its result is discarded.
                    abort.abort();
                    Err(timed_out())
                }
            }
        }
        RegisteredCallable::Async(callable) => {
            let task = tokio::spawn(async move { callable.call(args).await });
            let abort = task.abort_handle();
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(result)) => result.map_err(failed),
                Ok(Err(join_err)) if join_err.is_panic() => Err(ExecutionError::CallableFailure {
                    node_id: node_id.to_string(),
                    message: "callable panicked".to_string(),
                }),
                Ok(Err(_)) => Err(ExecutionError::Cancelled(node_id.to_string())),
                Err(_) => {
                    abort.abort();
                    Err(timed_out())
                }
            }
        }
    }
}
