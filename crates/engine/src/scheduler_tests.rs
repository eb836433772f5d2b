// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::artifact::ArtifactStore;
use crate::pool::ConnectionPool;
use crate::worker::WorkerPool;
use chrono::TimeZone;
use netcfg_adapters::{FakeSessionAdapter, SessionTimeouts};
use netcfg_core::{
    Device, DeviceId, DeviceType, FakeClock, FrequencyConfig, Protocol, SequentialIdGen,
};
use netcfg_storage::DeviceStore;
use std::time::Duration as StdDuration;
use tempfile::tempdir;

#[derive(Clone)]
struct PlaintextResolver;

impl CredentialResolver for PlaintextResolver {
    fn resolve(&self, device: &Device) -> Result<netcfg_adapters::DeviceConnectInfo, String> {
        Ok(netcfg_adapters::DeviceConnectInfo {
            ip_address: device.ip_address.clone(),
            port: device.port,
            protocol: device.protocol,
            device_type: device.device_type,
            username: device.username.clone(),
            password: device.password_encrypted.clone(),
            enable_password: None,
        })
    }
}

fn shanghai() -> Tz {
    chrono_tz::Asia::Shanghai
}

#[test]
fn validate_accepts_well_formed_expression() {
    assert!(validate("30 2 * * 1").is_ok());
    assert!(validate("*/5 * * * *").is_err()); // step syntax not supported
}

#[test]
fn validate_rejects_wrong_field_count() {
    let err = validate("30 2 * *").unwrap_err();
    assert_eq!(err, ScheduleError::WrongFieldCount("30 2 * *".to_string()));
}

#[test]
fn validate_rejects_out_of_domain_value() {
    let err = validate("30 24 * * *").unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidField { field: "hour", .. }));
}

#[test]
fn weekly_cron_derivation_matches_frequency_config() {
    let freq = FrequencyConfig::Weekly { weekday: 1, hour: 2, minute: 30 };
    assert_eq!(freq.to_cron_expression(), "30 2 * * 1");
}

#[test]
fn next_fire_time_weekly_lands_on_following_monday() {
    let from = shanghai()
        .with_ymd_and_hms(2025, 10, 22, 10, 0, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc);

    let next = next_fire_time("30 2 * * 1", from, shanghai()).unwrap();
    let expected = shanghai()
        .with_ymd_and_hms(2025, 10, 27, 2, 30, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc);
    assert_eq!(next, expected);
}

#[test]
fn next_fire_time_daily_rolls_to_tomorrow_when_time_has_passed() {
    let from = shanghai()
        .with_ymd_and_hms(2025, 1, 1, 23, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc);
    let next = next_fire_time("0 9 * * *", from, shanghai()).unwrap();
    let expected = shanghai()
        .with_ymd_and_hms(2025, 1, 2, 9, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(next, expected);
}

async fn build_scheduler(
    dir: &std::path::Path,
) -> (
    Scheduler<FakeSessionAdapter, FakeClock, SequentialIdGen, PlaintextResolver>,
    Arc<DeviceStore>,
    Arc<ScheduledTaskStore>,
    Arc<TaskExecutionStore>,
    Arc<TaskStore>,
    FakeSessionAdapter,
) {
    let db_url = format!("sqlite://{}/test.db", dir.display());
    let sqlite_pool = netcfg_storage::connect(&db_url).await.unwrap();
    let device_store = Arc::new(DeviceStore::new(sqlite_pool.clone()));
    let task_store = Arc::new(TaskStore::new(sqlite_pool.clone()));
    let scheduled_store = Arc::new(ScheduledTaskStore::new(sqlite_pool.clone()));
    let execution_store = Arc::new(TaskExecutionStore::new(sqlite_pool));

    let adapter = FakeSessionAdapter::new();
    let connection_pool = Arc::new(ConnectionPool::new(adapter.clone(), 10));
    let artifact_store = Arc::new(ArtifactStore::new(dir.join("backups"), false));
    let clock = FakeClock::new(shanghai().with_ymd_and_hms(2025, 10, 22, 10, 0, 0).single().unwrap().with_timezone(&Utc));
    let id_gen = SequentialIdGen::new("task");

    let worker_pool = Arc::new(WorkerPool::new(
        Arc::clone(&device_store),
        Arc::clone(&task_store),
        connection_pool,
        artifact_store,
        clock.clone(),
        id_gen.clone(),
        PlaintextResolver,
        10,
        SessionTimeouts::default(),
        StdDuration::from_secs(300),
        false,
    ));

    let scheduler = Scheduler::new(
        Arc::clone(&scheduled_store),
        Arc::clone(&execution_store),
        Arc::clone(&task_store),
        worker_pool,
        clock,
        SequentialIdGen::new("exec"),
        shanghai(),
    );

    (scheduler, device_store, scheduled_store, execution_store, task_store, adapter)
}

#[tokio::test]
async fn install_persists_job_with_computed_next_run_at() {
    let dir = tempdir().unwrap();
    let (scheduler, _devices, scheduled_store, _executions, _tasks, _adapter) = build_scheduler(dir.path()).await;

    let id_gen = SequentialIdGen::new("sched");
    let job = ScheduledTask::new(
        netcfg_core::ScheduledTaskId::new(id_gen.next()),
        "weekly-core-routers",
        TaskType::Scheduled,
        FrequencyConfig::Weekly { weekday: 1, hour: 2, minute: 30 },
        vec![],
        "show running-config",
        "operator",
        shanghai().with_ymd_and_hms(2025, 10, 22, 10, 0, 0).single().unwrap().with_timezone(&Utc),
    );

    let installed = scheduler.install(job).await.unwrap();
    assert!(installed.next_run_at.is_some());

    let reloaded = scheduled_store.get(&installed.id).await.unwrap();
    assert_eq!(reloaded.next_run_at, installed.next_run_at);
}

#[tokio::test]
async fn tick_fires_due_job_and_reconciliation_closes_it_once_tasks_finish() {
    let dir = tempdir().unwrap();
    let (scheduler, device_store, scheduled_store, execution_store, task_store, adapter) =
        build_scheduler(dir.path()).await;

    let dev_id_gen = SequentialIdGen::new("dev");
    let now = shanghai().with_ymd_and_hms(2025, 10, 22, 10, 0, 0).single().unwrap().with_timezone(&Utc);
    let device = Device {
        id: DeviceId::new(dev_id_gen.next()),
        alias: Some("R1".to_string()),
        ip_address: "10.0.2.2".to_string(),
        port: 22,
        protocol: Protocol::Ssh,
        device_type: DeviceType::CiscoIos,
        username: "admin".to_string(),
        password_encrypted: "secret".to_string(),
        enable_password_encrypted: None,
        default_command: "show running-config".to_string(),
        active: true,
        created_at: now,
        updated_at: now,
        last_backup_at: None,
        last_backup_status: None,
    };
    device_store.insert(&device).await.unwrap();
    adapter.script(&device.ip_address, "show running-config", "hostname R1\n");

    let sched_id_gen = SequentialIdGen::new("sched");
    let mut job = ScheduledTask::new(
        netcfg_core::ScheduledTaskId::new(sched_id_gen.next()),
        "nightly",
        TaskType::Scheduled,
        FrequencyConfig::Daily { hour: 9, minute: 0 },
        vec![device.id.clone()],
        "show running-config",
        "operator",
        now,
    );
    // Force the job due right now instead of the naturally-computed next day.
    job.next_run_at = Some(now);
    scheduled_store.insert(&job).await.unwrap();

    scheduler.tick().await;

    let recent = task_store.recent_tasks(10).await.unwrap();
    assert_eq!(recent.len(), 1);
    let task_id = recent[0].id.clone();

    for _ in 0..200 {
        let task = task_store.get(&task_id).await.unwrap();
        if task.status.is_terminal() {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }

    scheduler.reconcile_executions().await;
    let running = execution_store.list_running().await.unwrap();
    assert!(running.is_empty(), "execution should have closed once its task reached a terminal state");
}
