use std::sync::Arc;

use navshell::tracker::{
    ApprovalOutcome, ApproverService, FileRecordStore, MemoryRecordStore, RecordStore, StatusTracker,
    TransitionKind, WorkflowStatus,
};
use navshell::{create_event_channel, ApprovalError, ShellError, ShellEvent};

fn memory_tracker(threshold: u64) -> Arc<StatusTracker> {
    Arc::new(StatusTracker::new(Arc::new(MemoryRecordStore::new()), threshold))
}

#[tokio::test]
async fn test_quarantine_holds_until_approved() {
    let tracker = memory_tracker(3);
    for _ in 0..10 {
        let record = tracker.record_execution("math.add", true).await.unwrap();
        assert_eq!(record.status, WorkflowStatus::Quarantine);
    }
    let record = tracker.record("math.add").await.unwrap().unwrap();
    assert_eq!(record.execution_count, 10);
    assert!(record.approved_by.is_none());

    let outcome = tracker.approve("math.add", "alice").await.unwrap();
    let record = outcome.record();
    assert_eq!(record.status, WorkflowStatus::Golden);
    assert_eq!(record.approved_by.as_deref(), Some("alice"));
    assert!(record.approved_at.is_some());
    let kinds: Vec<TransitionKind> = record.history.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TransitionKind::FirstExecution, TransitionKind::Approval]);
}

#[tokio::test]
async fn test_concurrent_approvals_one_success_one_noop() {
    let tracker = memory_tracker(3);
    tracker.record_execution("fam.run", true).await.unwrap();
    let (handle, _task) = ApproverService::spawn(tracker.clone(), 8);

    let observed = tracker.record("fam.run").await.unwrap().unwrap().status_version();
    let (a, b) = tokio::join!(
        handle.approve_expecting("fam.run", "alice", observed),
        handle.approve_expecting("fam.run", "bob", observed),
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    let approved = outcomes.iter().filter(|o| o.changed()).count();
    let noops = outcomes
        .iter()
        .filter(|o| matches!(o, ApprovalOutcome::AlreadyApproved(_)))
        .count();
    assert_eq!((approved, noops), (1, 1));

    let record = tracker.record("fam.run").await.unwrap().unwrap();
    assert_eq!(record.history.len(), 2);

    // a later approval that saw the golden record is a contradiction
    let err = handle
        .approve_expecting("fam.run", "carol", record.status_version())
        .await
        .unwrap_err();
    assert!(matches!(err, ShellError::Approval(ApprovalError::AlreadyGolden(_))));
}

#[tokio::test]
async fn test_concurrent_executions_do_not_lose_counts() {
    let tracker = memory_tracker(3);
    let mut tasks = Vec::new();
    for i in 0..32 {
        let tracker = tracker.clone();
        tasks.push(tokio::spawn(async move {
            tracker.record_execution("fam.run", i % 4 != 0).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    let record = tracker.record("fam.run").await.unwrap().unwrap();
    assert_eq!(record.execution_count, 32);
    assert_eq!(record.failure_count, 8);
    assert_eq!(tracker.pending().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store: Arc<dyn RecordStore> = Arc::new(FileRecordStore::new(dir.path()).unwrap());
        let tracker = StatusTracker::new(store, 3);
        tracker.record_execution("system.tools/echo", true).await.unwrap();
        tracker.record_execution("math.add", false).await.unwrap();
        tracker.approve("math.add", "alice").await.unwrap();
    }

    let store: Arc<dyn RecordStore> = Arc::new(FileRecordStore::new(dir.path()).unwrap());
    let tracker = StatusTracker::new(store, 3);
    let records = tracker.records().await.unwrap();
    let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["math.add", "system.tools/echo"]);
    assert_eq!(tracker.status("math.add").await.unwrap(), WorkflowStatus::Golden);
    assert_eq!(records[0].failure_count, 1);

    let pending = tracker.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].path, "system.tools/echo");
}

#[tokio::test]
async fn test_golden_failures_flag_without_regressing() {
    let (tx, mut rx) = create_event_channel();
    let tracker = StatusTracker::new(Arc::new(MemoryRecordStore::new()), 2).with_events(tx);
    tracker.record_execution("fam.run", true).await.unwrap();
    tracker.approve("fam.run", "alice").await.unwrap();

    tracker.record_execution("fam.run", false).await.unwrap();
    let record = tracker.record_execution("fam.run", false).await.unwrap();
    assert!(record.flagged_for_review);
    assert_eq!(record.status, WorkflowStatus::Golden);
    assert_eq!(tracker.flagged().await.unwrap().len(), 1);

    let mut flagged = 0;
    while let Ok(event) = rx.try_recv() {
        if let ShellEvent::FlaggedForReview { failure_count, .. } = event {
            assert_eq!(failure_count, 2);
            flagged += 1;
        }
    }
    assert_eq!(flagged, 1);

    // only an explicit revoke regresses the record
    let record = tracker.revoke("fam.run", "bob").await.unwrap();
    assert_eq!(record.status, WorkflowStatus::Quarantine);
    assert!(!record.flagged_for_review);
}

#[tokio::test]
async fn test_contradictory_actions_are_errors() {
    let tracker = memory_tracker(3);
    assert!(matches!(
        tracker.approve("never.ran", "alice").await,
        Err(ShellError::Approval(ApprovalError::NotInQuarantine {
            status: WorkflowStatus::Unran,
            ..
        }))
    ));
    assert!(matches!(
        tracker.approve_expecting("never.ran", "alice", 1).await,
        Err(ShellError::Approval(ApprovalError::UnknownRecord(_)))
    ));
    tracker.record_execution("fam.run", true).await.unwrap();
    assert!(matches!(
        tracker.revoke("fam.run", "bob").await,
        Err(ShellError::Approval(ApprovalError::NotGolden { .. }))
    ));
}
