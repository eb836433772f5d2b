use super::*;
use crate::test_support::build_test_orchestrator;
use clap::Parser;
use netcfg_core::{BackupTaskId, DeviceId, TaskType};
use chrono::Utc;

#[derive(Parser)]
struct TestCli {
    #[command(subcommand)]
    command: BackupCommand,
}

#[test]
fn batch_collects_trailing_device_ids() {
    let cli = TestCli::try_parse_from(["backup", "batch", "d1", "d2", "d3"]).expect("parses");
    match cli.command {
        BackupCommand::Batch { device_ids, .. } => assert_eq!(device_ids, vec!["d1", "d2", "d3"]),
        _ => panic!("expected Batch"),
    }
}

#[tokio::test]
async fn run_against_unknown_device_fails_fast() {
    let (_dir, orchestrator) = build_test_orchestrator().await;
    // Goes straight at the orchestrator: `handle`'s `.context(...)` wrapping
    // replaces the inner error's `Display` text, so asserting on "not found"
    // through the anyhow-wrapped CLI result would check the wrong string.
    let err = orchestrator
        .backup_single(&DeviceId::new("missing"), "cli", None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn print_task_reports_error_message_on_failure() {
    let task = netcfg_core::BackupTask {
        id: BackupTaskId::new("t1"),
        device_id: DeviceId::new("d1"),
        submitter_id: "cli".to_string(),
        task_type: TaskType::Manual,
        status: TaskStatus::Failed,
        effective_command: "show running-config".to_string(),
        artifact_path: None,
        artifact_size_bytes: None,
        artifact_sha256: None,
        started_at: Some(Utc::now()),
        completed_at: Some(Utc::now()),
        created_at: Utc::now(),
        error_message: Some("connection refused".to_string()),
        retry_count: 0,
        max_retries: 3,
    };
    assert!(print_task(&task, OutputFormat::Text).is_ok());
}
