use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// Engine events, delivered over an unbounded channel.
#[derive(Clone, Debug, Serialize)]
pub enum ShellEvent {
    /// A new snapshot became active.
    SnapshotActivated {
        generation: u64,
        warnings: usize,
        timestamp: DateTime<Utc>,
    },

    ExecutionStarted {
        node_id: String,
        timestamp: DateTime<Utc>,
    },

    ExecutionFinished {
        node_id: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// First execution of a path; it now waits for approval.
    QuarantineEntered {
        path: String,
        timestamp: DateTime<Utc>,
    },

    Approved {
        path: String,
        approver: String,
        timestamp: DateTime<Utc>,
    },

    Revoked {
        path: String,
        actor: String,
        timestamp: DateTime<Utc>,
    },

    /// A pending approval was turned down.
    Rejected {
        path: String,
        actor: String,
        timestamp: DateTime<Utc>,
    },

    /// A golden path crossed the failure threshold. Its status is unchanged.
    FlaggedForReview {
        path: String,
        failure_count: u64,
        timestamp: DateTime<Utc>,
    },
}

pub type EventSender = mpsc::UnboundedSender<ShellEvent>;

pub type EventReceiver = mpsc::UnboundedReceiver<ShellEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Send if a sender is attached; a closed receiver is not an error.
pub(crate) fn emit(sender: Option<&EventSender>, event: ShellEvent) {
    if let Some(sender) = sender {
        let _ = sender.send(event);
    }
}
