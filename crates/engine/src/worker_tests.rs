// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use netcfg_adapters::FakeSessionAdapter;
use netcfg_core::{DeviceId, DeviceType, FakeClock, Protocol, SequentialIdGen, TaskType};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[derive(Clone)]
struct PlaintextResolver;

impl CredentialResolver for PlaintextResolver {
    fn resolve(&self, device: &netcfg_core::Device) -> Result<DeviceConnectInfo, String> {
        Ok(DeviceConnectInfo {
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

async fn test_pool(
    dir: &std::path::Path,
) -> (
    Arc<WorkerPool<FakeSessionAdapter, FakeClock, SequentialIdGen, PlaintextResolver>>,
    Arc<DeviceStore>,
    Arc<TaskStore>,
    FakeSessionAdapter,
) {
    let db_url = format!("sqlite://{}/test.db", dir.display());
    let sqlite_pool = netcfg_storage::connect(&db_url).await.unwrap();
    let device_store = Arc::new(DeviceStore::new(sqlite_pool.clone()));
    let task_store = Arc::new(TaskStore::new(sqlite_pool));
    let adapter = FakeSessionAdapter::new();
    let connection_pool = Arc::new(ConnectionPool::new(adapter.clone(), 10));
    let artifact_store = Arc::new(ArtifactStore::new(dir.join("backups"), false));
    let clock = FakeClock::new(chrono::Utc::now());
    let id_gen = SequentialIdGen::new("task");

    let worker_pool = Arc::new(WorkerPool::new(
        Arc::clone(&device_store),
        Arc::clone(&task_store),
        connection_pool,
        artifact_store,
        clock,
        id_gen,
        PlaintextResolver,
        10,
        SessionTimeouts::default(),
        Duration::from_secs(300),
        false,
    ));
    (worker_pool, device_store, task_store, adapter)
}

async fn register_device(store: &DeviceStore, ip: &str, id_gen: &SequentialIdGen) -> netcfg_core::Device {
    let now = chrono::Utc::now();
    let device = netcfg_core::Device {
        id: DeviceId::new(id_gen.next()),
        alias: Some(format!("device-{ip}")),
        ip_address: ip.to_string(),
        port: 22,
        protocol: Protocol::Ssh,
        device_type: DeviceType::CiscoIos,
        username: "admin".to_string(),
        password_encrypted: "plaintext-secret".to_string(),
        enable_password_encrypted: None,
        default_command: "show version".to_string(),
        active: true,
        created_at: now,
        updated_at: now,
        last_backup_at: None,
        last_backup_status: None,
    };
    store.insert(&device).await.unwrap();
    device
}

#[tokio::test]
async fn single_task_reaches_success_with_artifact() {
    let dir = tempdir().unwrap();
    let (pool, device_store, task_store, adapter) = test_pool(dir.path()).await;
    let id_gen = SequentialIdGen::new("dev");
    let device = register_device(&device_store, "10.0.0.2", &id_gen).await;
    adapter.script("10.0.0.2", "show version", "Cisco IOS Software, Version 15.1");

    let task_ids = pool
        .submit_batch(&[device.id.clone()], "operator", TaskType::Manual, None)
        .await
        .unwrap();
    assert_eq!(task_ids.len(), 1);

    let task_id = task_ids[0].clone();
    wait_for_terminal(&task_store, &task_id).await;

    let task = task_store.get(&task_id).await.unwrap();
    assert_eq!(task.status, netcfg_core::TaskStatus::Success);
    assert!(task.artifact_path.is_some());
    assert!(task.artifact_sha256.is_some());

    let updated_device = device_store.get(&device.id).await.unwrap();
    assert_eq!(updated_device.last_backup_status, Some(netcfg_core::LastBackupStatus::Success));
}

#[tokio::test]
async fn auth_failure_finalizes_failed_without_artifact() {
    let dir = tempdir().unwrap();
    let (pool, device_store, task_store, adapter) = test_pool(dir.path()).await;
    let id_gen = SequentialIdGen::new("dev");
    let device = register_device(&device_store, "10.0.0.3", &id_gen).await;
    adapter.fail_auth("10.0.0.3", "bad password");

    let task_ids = pool
        .submit_batch(&[device.id.clone()], "operator", TaskType::Manual, None)
        .await
        .unwrap();
    let task_id = task_ids[0].clone();
    wait_for_terminal(&task_store, &task_id).await;

    let task = task_store.get(&task_id).await.unwrap();
    assert_eq!(task.status, netcfg_core::TaskStatus::Failed);
    assert!(task.artifact_path.is_none());
    let updated_device = device_store.get(&device.id).await.unwrap();
    assert_eq!(updated_device.last_backup_status, Some(netcfg_core::LastBackupStatus::Failed));
}

#[tokio::test]
async fn batch_of_five_respects_concurrency_cap() {
    let dir = tempdir().unwrap();
    let db_url = format!("sqlite://{}/test.db", dir.path().display());
    let sqlite_pool = netcfg_storage::connect(&db_url).await.unwrap();
    let device_store = Arc::new(DeviceStore::new(sqlite_pool.clone()));
    let task_store = Arc::new(TaskStore::new(sqlite_pool));
    let adapter = FakeSessionAdapter::new();
    let connection_pool = Arc::new(ConnectionPool::new(adapter.clone(), 10));
    let artifact_store = Arc::new(ArtifactStore::new(dir.path().join("backups"), false));
    let clock = FakeClock::new(chrono::Utc::now());
    let id_gen = SequentialIdGen::new("task");

    let worker_pool = Arc::new(WorkerPool::new(
        Arc::clone(&device_store),
        Arc::clone(&task_store),
        connection_pool,
        artifact_store,
        clock,
        id_gen,
        PlaintextResolver,
        2,
        SessionTimeouts::default(),
        Duration::from_secs(300),
        false,
    ));

    let dev_id_gen = SequentialIdGen::new("dev");
    let mut device_ids = Vec::new();
    for n in 0..5 {
        let device = register_device(&device_store, &format!("10.0.1.{n}"), &dev_id_gen).await;
        adapter.script(&device.ip_address, "show version", "output");
        device_ids.push(device.id);
    }

    let task_ids = worker_pool
        .submit_batch(&device_ids, "operator", TaskType::Batch, None)
        .await
        .unwrap();
    assert_eq!(task_ids.len(), 5);

    for task_id in &task_ids {
        wait_for_terminal(&task_store, task_id).await;
    }
    for task_id in &task_ids {
        let task = task_store.get(task_id).await.unwrap();
        assert_eq!(task.status, netcfg_core::TaskStatus::Success);
    }
}

#[tokio::test]
async fn per_device_serialization_execution_windows_do_not_overlap() {
    let dir = tempdir().unwrap();
    let (pool, device_store, task_store, adapter) = test_pool(dir.path()).await;
    let id_gen = SequentialIdGen::new("dev");
    let device = register_device(&device_store, "10.0.0.9", &id_gen).await;
    adapter.script(&device.ip_address, "show version", "output");
    adapter.set_execute_delay(&device.ip_address, Duration::from_millis(50));

    let task_ids = pool
        .submit_batch(
            &[device.id.clone(), device.id.clone()],
            "operator",
            TaskType::Manual,
            None,
        )
        .await
        .unwrap();
    assert_eq!(task_ids.len(), 2);

    for task_id in &task_ids {
        wait_for_terminal(&task_store, task_id).await;
    }
    for task_id in &task_ids {
        let task = task_store.get(task_id).await.unwrap();
        assert_eq!(task.status, netcfg_core::TaskStatus::Success);
    }

    let windows = adapter.execute_windows(&device.ip_address);
    assert_eq!(windows.len(), 2, "both tasks should have executed");
    let (a_start, a_end) = windows[0];
    let (b_start, b_end) = windows[1];
    assert!(
        b_start >= a_end || a_start >= b_end,
        "execute windows overlapped: a=[{a_start:?}, {a_end:?}] b=[{b_start:?}, {b_end:?}]"
    );
}

async fn wait_for_terminal(task_store: &TaskStore, task_id: &BackupTaskId) {
    for _ in 0..200 {
        let task = task_store.get(task_id).await.unwrap();
        if task.status.is_terminal() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {task_id} did not reach a terminal state in time");
}
