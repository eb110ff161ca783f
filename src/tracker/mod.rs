//! Workflow status tracking: durable per-path records, the quarantine and
//! golden trust states, the pending-approval queue and the approver service.

mod approver;
mod record;
mod status;
mod store;

pub use approver::{ApprovalCommand, ApproverHandle, ApproverService};
pub use record::{StatusTransition, TransitionKind, WorkflowRecord, WorkflowStatus};
pub use status::{ApprovalOutcome, StatusTracker, DEFAULT_FAILURE_THRESHOLD};
pub use store::{FileRecordStore, MemoryRecordStore, PendingApproval, RecordStore};
