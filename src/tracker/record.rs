use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trust state of an executed node path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Never executed; no record exists yet.
    Unran,
    /// Executed but not approved.
    Quarantine,
    /// Explicitly approved for unattended reuse.
    Golden,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Unran => f.write_str("unran"),
            WorkflowStatus::Quarantine => f.write_str("quarantine"),
            WorkflowStatus::Golden => f.write_str("golden"),
        }
    }
}

/// Why a status changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    FirstExecution,
    Approval,
    Revocation,
    /// A pending approval was turned down; the record stays in quarantine.
    Rejection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
    pub kind: TransitionKind,
    pub actor: Option<String>,
    pub at: DateTime<Utc>,
}

/// Durable record of one executed node path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub path: String,
    pub status: WorkflowStatus,
    pub execution_count: u64,
    pub failure_count: u64,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub last_executed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flagged_for_review: bool,
    /// Append-only.
    #[serde(default)]
    pub history: Vec<StatusTransition>,
}

impl WorkflowRecord {
    /// A record for a path's first execution, already in quarantine.
    pub fn first_execution(path: &str, now: DateTime<Utc>) -> Self {
        Self {
            path: path.to_string(),
            status: WorkflowStatus::Quarantine,
            execution_count: 0,
            failure_count: 0,
            approved_by: None,
            approved_at: None,
            last_executed_at: None,
            flagged_for_review: false,
            history: vec![StatusTransition {
                from: WorkflowStatus::Unran,
                to: WorkflowStatus::Quarantine,
                kind: TransitionKind::FirstExecution,
                actor: None,
                at: now,
            }],
        }
    }

    /// Number of status transitions so far; the compare-and-swap token for
    /// approval.
    pub fn status_version(&self) -> usize {
        self.history.len()
    }

    /// Quarantined, with its last review request turned down.
    pub fn is_rejected(&self) -> bool {
        self.status == WorkflowStatus::Quarantine
            && self.history.last().is_some_and(|t| t.kind == TransitionKind::Rejection)
    }

    /// Count one execution. Returns true when this call raised the review flag.
    pub fn count_execution(&mut self, success: bool, now: DateTime<Utc>, failure_threshold: u64) -> bool {
        self.execution_count += 1;
        self.last_executed_at = Some(now);
        if success {
            return false;
        }
        self.failure_count += 1;
        if self.status == WorkflowStatus::Golden
            && !self.flagged_for_review
            && self.failure_count >= failure_threshold
        {
            self.flagged_for_review = true;
            return true;
        }
        false
    }

    pub(crate) fn push_transition(
        &mut self,
        to: WorkflowStatus,
        kind: TransitionKind,
        actor: &str,
        now: DateTime<Utc>,
    ) {
        self.history.push(StatusTransition {
            from: self.status,
            to,
            kind,
            actor: Some(actor.to_string()),
            at: now,
        });
        self.status = to;
    }
}
