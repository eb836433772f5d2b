use super::*;

fn sample() -> BackupTask {
    BackupTask {
        id: BackupTaskId::new("task-1"),
        device_id: DeviceId::new("dev-1"),
        submitter_id: "operator".to_string(),
        task_type: TaskType::Manual,
        status: TaskStatus::Pending,
        effective_command: "show running-config".to_string(),
        artifact_path: None,
        artifact_size_bytes: None,
        artifact_sha256: None,
        started_at: None,
        completed_at: None,
        created_at: Utc::now(),
        error_message: None,
        retry_count: 0,
        max_retries: BackupTask::DEFAULT_MAX_RETRIES,
    }
}

#[test]
fn status_dag_allows_only_forward_edges() {
    assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Running));
    assert!(TaskStatus::Running.can_transition_to(TaskStatus::Success));
    assert!(TaskStatus::Running.can_transition_to(TaskStatus::Failed));
    assert!(!TaskStatus::Success.can_transition_to(TaskStatus::Running));
    assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Success));
    assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Pending));
}

#[test]
fn terminal_statuses_are_final() {
    assert!(TaskStatus::Success.is_terminal());
    assert!(TaskStatus::Failed.is_terminal());
    assert!(TaskStatus::Cancelled.is_terminal());
    assert!(!TaskStatus::Pending.is_terminal());
    assert!(!TaskStatus::Running.is_terminal());
}

#[test]
fn artifact_invariant_requires_all_three_fields_on_success() {
    let mut task = sample();
    task.status = TaskStatus::Success;
    assert!(!task.artifact_invariant_holds());

    task.artifact_path = Some("backups/r1/x.txt".to_string());
    task.artifact_size_bytes = Some(10);
    task.artifact_sha256 = Some("abc".to_string());
    assert!(task.artifact_invariant_holds());
}

#[test]
fn artifact_invariant_rejects_artifact_fields_on_non_success() {
    let mut task = sample();
    task.status = TaskStatus::Failed;
    task.artifact_path = Some("backups/r1/x.txt".to_string());
    task.artifact_size_bytes = Some(10);
    task.artifact_sha256 = Some("abc".to_string());
    assert!(!task.artifact_invariant_holds());
}

#[test]
fn timing_invariant_holds_when_started_before_completed() {
    let mut task = sample();
    let now = Utc::now();
    task.started_at = Some(now);
    task.completed_at = Some(now + chrono::Duration::seconds(5));
    assert!(task.timing_invariant_holds());

    task.completed_at = Some(now - chrono::Duration::seconds(5));
    assert!(!task.timing_invariant_holds());
}
