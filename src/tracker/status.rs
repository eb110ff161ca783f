use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ApprovalError, ShellError, StoreError};
use crate::events::{emit, EventSender, ShellEvent};

use super::record::{TransitionKind, WorkflowRecord, WorkflowStatus};
use super::store::{PendingApproval, RecordStore};

pub const DEFAULT_FAILURE_THRESHOLD: u64 = 3;

/// Result of an approval that was not contradictory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// This call moved the record to golden.
    Approved(WorkflowRecord),
    /// A concurrent approval already did; nothing changed.
    AlreadyApproved(WorkflowRecord),
}

impl ApprovalOutcome {
    pub fn record(&self) -> &WorkflowRecord {
        match self {
            ApprovalOutcome::Approved(r) | ApprovalOutcome::AlreadyApproved(r) => r,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, ApprovalOutcome::Approved(_))
    }
}

/// Owns workflow records and the pending-approval queue.
///
/// Mutations of one path are serialised by a per-path lock; distinct paths
/// proceed independently.
pub struct StatusTracker {
    store: Arc<dyn RecordStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    queue_lock: Mutex<()>,
    failure_threshold: u64,
    events: Option<EventSender>,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn RecordStore>, failure_threshold: u64) -> Self {
        Self {
            store,
            locks: DashMap::new(),
            queue_lock: Mutex::new(()),
            failure_threshold,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    fn lock_for(&self, path: &str) -> Arc<Mutex<()>> {
        self.locks.entry(path.to_string()).or_default().value().clone()
    }

    /// Count one execution of `path`, creating the record on first use.
    pub async fn record_execution(&self, path: &str, success: bool) -> Result<WorkflowRecord, StoreError> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().await;
        let now = Utc::now();

        let (mut record, created) = match self.store.load(path).await? {
            Some(record) => (record, false),
            None => (WorkflowRecord::first_execution(path, now), true),
        };
        let flagged = record.count_execution(success, now, self.failure_threshold);
        self.store.save(&record).await?;

        if record.is_rejected() && self.enqueue(path, record.status_version()).await? {
            info!(path, "rejected workflow queued for review again");
        }
        if created {
            self.enqueue(path, record.status_version()).await?;
            info!(path, "workflow entered quarantine");
            emit(
                self.events.as_ref(),
                ShellEvent::QuarantineEntered {
                    path: path.to_string(),
                    timestamp: now,
                },
            );
        }
        if flagged {
            warn!(path, failure_count = record.failure_count, "golden workflow flagged for review");
            emit(
                self.events.as_ref(),
                ShellEvent::FlaggedForReview {
                    path: path.to_string(),
                    failure_count: record.failure_count,
                    timestamp: now,
                },
            );
        }
        debug!(
            path,
            success,
            executions = record.execution_count,
            failures = record.failure_count,
            "execution recorded"
        );
        Ok(record)
    }

    pub async fn record(&self, path: &str) -> Result<Option<WorkflowRecord>, StoreError> {
        self.store.load(path).await
    }

    pub async fn status(&self, path: &str) -> Result<WorkflowStatus, StoreError> {
        Ok(self
            .store
            .load(path)
            .await?
            .map(|r| r.status)
            .unwrap_or(WorkflowStatus::Unran))
    }

    pub async fn records(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        self.store.list().await
    }

    /// Records currently flagged for review.
    pub async fn flagged(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|r| r.flagged_for_review)
            .collect())
    }

    /// Pending approvals, oldest first.
    pub async fn pending(&self) -> Result<Vec<PendingApproval>, StoreError> {
        self.store.load_pending().await
    }

    /// Approve `path` as currently observed.
    pub async fn approve(&self, path: &str, approver: &str) -> Result<ApprovalOutcome, ShellError> {
        let observed = self.store.load(path).await?.ok_or_else(|| ApprovalError::NotInQuarantine {
            path: path.to_string(),
            status: WorkflowStatus::Unran,
        })?;
        self.approve_expecting(path, approver, observed.status_version()).await
    }

    /// Compare-and-swap approval.
    ///
    /// `expected` is the status version the caller observed. If the record
    /// is still in quarantine it becomes golden. If it is golden because of
    /// an approval made right after `expected`, the call is a no-op. Any
    /// other golden record is a contradiction.
    pub async fn approve_expecting(
        &self,
        path: &str,
        approver: &str,
        expected: usize,
    ) -> Result<ApprovalOutcome, ShellError> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().await;

        let mut record = self
            .store
            .load(path)
            .await?
            .ok_or_else(|| ApprovalError::UnknownRecord(path.to_string()))?;

        match record.status {
            WorkflowStatus::Quarantine => {
                let now = Utc::now();
                record.push_transition(WorkflowStatus::Golden, TransitionKind::Approval, approver, now);
                record.approved_by = Some(approver.to_string());
                record.approved_at = Some(now);
                record.flagged_for_review = false;
                self.store.save(&record).await?;
                self.dequeue(path).await?;
                info!(path, approver, "workflow approved");
                emit(
                    self.events.as_ref(),
                    ShellEvent::Approved {
                        path: path.to_string(),
                        approver: approver.to_string(),
                        timestamp: now,
                    },
                );
                Ok(ApprovalOutcome::Approved(record))
            }
            WorkflowStatus::Golden => {
                let raced = record.status_version() == expected + 1
                    && record
                        .history
                        .get(expected)
                        .is_some_and(|t| t.kind == TransitionKind::Approval);
                if raced {
                    debug!(path, approver, "concurrent approval, no-op");
                    Ok(ApprovalOutcome::AlreadyApproved(record))
                } else {
                    Err(ApprovalError::AlreadyGolden(path.to_string()).into())
                }
            }
            status => Err(ApprovalError::NotInQuarantine {
                path: path.to_string(),
                status,
            }
            .into()),
        }
    }

    /// Turn down the pending approval of `path`. The record stays in
    /// quarantine and leaves the queue until its next execution.
    pub async fn reject(&self, path: &str, actor: &str) -> Result<WorkflowRecord, ShellError> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().await;

        let Some(mut record) = self.store.load(path).await? else {
            return Err(ApprovalError::NotInQuarantine {
                path: path.to_string(),
                status: WorkflowStatus::Unran,
            }
            .into());
        };
        if record.status != WorkflowStatus::Quarantine {
            return Err(ApprovalError::NotInQuarantine {
                path: path.to_string(),
                status: record.status,
            }
            .into());
        }
        if !self.store.load_pending().await?.iter().any(|p| p.path == path) {
            return Err(ApprovalError::NotPending(path.to_string()).into());
        }

        let now = Utc::now();
        record.push_transition(WorkflowStatus::Quarantine, TransitionKind::Rejection, actor, now);
        self.store.save(&record).await?;
        self.dequeue(path).await?;
        info!(path, actor, "pending approval rejected");
        emit(
            self.events.as_ref(),
            ShellEvent::Rejected {
                path: path.to_string(),
                actor: actor.to_string(),
                timestamp: now,
            },
        );
        Ok(record)
    }

    /// Explicit regression: golden back to quarantine, re-queued for approval.
    pub async fn revoke(&self, path: &str, actor: &str) -> Result<WorkflowRecord, ShellError> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().await;

        let Some(mut record) = self.store.load(path).await? else {
            return Err(ApprovalError::NotGolden {
                path: path.to_string(),
                status: WorkflowStatus::Unran,
            }
            .into());
        };
        if record.status != WorkflowStatus::Golden {
            return Err(ApprovalError::NotGolden {
                path: path.to_string(),
                status: record.status,
            }
            .into());
        }

        let now = Utc::now();
        record.push_transition(WorkflowStatus::Quarantine, TransitionKind::Revocation, actor, now);
        record.flagged_for_review = false;
        self.store.save(&record).await?;
        self.enqueue(path, record.status_version()).await?;
        info!(path, actor, "workflow approval revoked");
        emit(
            self.events.as_ref(),
            ShellEvent::Revoked {
                path: path.to_string(),
                actor: actor.to_string(),
                timestamp: now,
            },
        );
        Ok(record)
    }

    /// Returns false when `path` was already queued.
    async fn enqueue(&self, path: &str, status_version: usize) -> Result<bool, StoreError> {
        let _guard = self.queue_lock.lock().await;
        let mut queue = self.store.load_pending().await?;
        if queue.iter().any(|p| p.path == path) {
            return Ok(false);
        }
        queue.push(PendingApproval {
            path: path.to_string(),
            queued_at: Utc::now(),
            status_version,
        });
        self.store.save_pending(&queue).await?;
        Ok(true)
    }

    async fn dequeue(&self, path: &str) -> Result<(), StoreError> {
        let _guard = self.queue_lock.lock().await;
        let mut queue = self.store.load_pending().await?;
        let before = queue.len();
        queue.retain(|p| p.path != path);
        if queue.len() != before {
            self.store.save_pending(&queue).await?;
        }
        Ok(())
    }
}
