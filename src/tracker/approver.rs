use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{ApprovalError, ShellError};

use super::record::WorkflowRecord;
use super::status::{ApprovalOutcome, StatusTracker};
use super::store::PendingApproval;

type Reply<T> = oneshot::Sender<Result<T, ShellError>>;

/// Requests handled by the approver service.
pub enum ApprovalCommand {
    Approve {
        path: String,
        approver: String,
        /// Status version the caller observed, if any.
        expected: Option<usize>,
        reply: Reply<ApprovalOutcome>,
    },
    Reject {
        path: String,
        actor: String,
        reply: Reply<WorkflowRecord>,
    },
    Revoke {
        path: String,
        actor: String,
        reply: Reply<WorkflowRecord>,
    },
    Pending {
        reply: Reply<Vec<PendingApproval>>,
    },
}

/// Serves approval commands over a channel. Runs until every handle is dropped.
pub struct ApproverService {
    tracker: Arc<StatusTracker>,
    rx: mpsc::Receiver<ApprovalCommand>,
}

impl ApproverService {
    /// Spawn the service on the current runtime.
    pub fn spawn(tracker: Arc<StatusTracker>, capacity: usize) -> (ApproverHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let service = Self { tracker, rx };
        let task = tokio::spawn(service.run());
        (ApproverHandle { tx }, task)
    }

    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            // per-path ordering is kept by the tracker
            let tracker = self.tracker.clone();
            tokio::spawn(async move { handle(&tracker, command).await });
        }
        debug!("approver service stopped");
    }
}

async fn handle(tracker: &StatusTracker, command: ApprovalCommand) {
    match command {
        ApprovalCommand::Approve {
            path,
            approver,
            expected,
            reply,
        } => {
            let result = match expected {
                Some(version) => tracker.approve_expecting(&path, &approver, version).await,
                None => tracker.approve(&path, &approver).await,
            };
            let _ = reply.send(result);
        }
        ApprovalCommand::Reject { path, actor, reply } => {
            let _ = reply.send(tracker.reject(&path, &actor).await);
        }
        ApprovalCommand::Revoke { path, actor, reply } => {
            let _ = reply.send(tracker.revoke(&path, &actor).await);
        }
        ApprovalCommand::Pending { reply } => {
            let _ = reply.send(tracker.pending().await.map_err(ShellError::from));
        }
    }
}

/// Cloneable client of the approver service.
#[derive(Clone)]
pub struct ApproverHandle {
    tx: mpsc::Sender<ApprovalCommand>,
}

impl ApproverHandle {
    pub async fn approve(&self, path: &str, approver: &str) -> Result<ApprovalOutcome, ShellError> {
        self.request(|reply| ApprovalCommand::Approve {
            path: path.to_string(),
            approver: approver.to_string(),
            expected: None,
            reply,
        })
        .await
    }

    pub async fn approve_expecting(
        &self,
        path: &str,
        approver: &str,
        expected: usize,
    ) -> Result<ApprovalOutcome, ShellError> {
        self.request(|reply| ApprovalCommand::Approve {
            path: path.to_string(),
            approver: approver.to_string(),
            expected: Some(expected),
            reply,
        })
        .await
    }

    pub async fn reject(&self, path: &str, actor: &str) -> Result<WorkflowRecord, ShellError> {
        self.request(|reply| ApprovalCommand::Reject {
            path: path.to_string(),
            actor: actor.to_string(),
            reply,
        })
        .await
    }

    pub async fn revoke(&self, path: &str, actor: &str) -> Result<WorkflowRecord, ShellError> {
        self.request(|reply| ApprovalCommand::Revoke {
            path: path.to_string(),
            actor: actor.to_string(),
            reply,
        })
        .await
    }

    pub async fn pending(&self) -> Result<Vec<PendingApproval>, ShellError> {
        self.request(|reply| ApprovalCommand::Pending { reply }).await
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> ApprovalCommand) -> Result<T, ShellError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| ApprovalError::ServiceUnavailable)?;
        rx.await.map_err(|_| ApprovalError::ServiceUnavailable)?
    }
}
