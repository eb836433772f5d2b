// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the Task/Device/Scheduled stores, Connection Pool, Worker Pool,
//! Scheduler and Credential Vault into one running `Orchestrator` (spec §2
//! data flow). Split out of `main.rs` so it can be built and ticked from
//! tests without a real process or signal handlers.

use std::sync::Arc;

use netcfg_adapters::{CredentialVault, MultiProtocolAdapter, SessionTimeouts};
use netcfg_core::{SystemClock, UuidIdGen};
use netcfg_engine::{
    parse_timezone, ArtifactStore, ConnectionPool, EngineConfig, Orchestrator, Scheduler,
    VaultCredentialResolver, WorkerPool,
};
use netcfg_storage::{connect, DeviceStore, ScheduledTaskStore, StorageError, TaskExecutionStore, TaskStore};
use thiserror::Error;

/// The concrete production instantiation of the generic `Orchestrator`:
/// real SSH/Telnet transport, wall-clock time, UUID ids, vault-backed
/// credentials.
pub type ProdOrchestrator = Orchestrator<MultiProtocolAdapter, SystemClock, UuidIdGen, VaultCredentialResolver>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("credential vault: {0}")]
    Vault(String),
}

/// Opens the database, builds every component named in spec §2, and returns
/// the single `Orchestrator` façade that owns them all.
pub async fn build(config: &EngineConfig) -> Result<Arc<ProdOrchestrator>, LifecycleError> {
    let pool = connect(&config.database_url).await?;

    let device_store = Arc::new(DeviceStore::new(pool.clone()));
    let task_store = Arc::new(TaskStore::new(pool.clone()));
    let scheduled_store = Arc::new(ScheduledTaskStore::new(pool.clone()));
    let execution_store = Arc::new(TaskExecutionStore::new(pool.clone()));
    let artifact_store = Arc::new(ArtifactStore::new(
        config.artifact_root.clone(),
        config.compress_backups,
    ));

    let vault = CredentialVault::from_env(config.vault_mode).map_err(LifecycleError::Vault)?;
    let credential_resolver = VaultCredentialResolver::new(vault);

    let connection_pool = Arc::new(ConnectionPool::new(
        MultiProtocolAdapter::new(),
        config.max_concurrent_backups,
    ));

    let clock = SystemClock;
    let id_gen = UuidIdGen;

    let worker_pool = Arc::new(WorkerPool::new(
        Arc::clone(&device_store),
        Arc::clone(&task_store),
        Arc::clone(&connection_pool),
        Arc::clone(&artifact_store),
        clock,
        id_gen,
        credential_resolver,
        config.max_concurrent_backups,
        SessionTimeouts::default(),
        std::time::Duration::from_secs(config.backup_timeout_secs),
        config.enable_diff,
    ));

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&scheduled_store),
        Arc::clone(&execution_store),
        Arc::clone(&task_store),
        Arc::clone(&worker_pool),
        clock,
        id_gen,
        parse_timezone(&config.scheduler_tz),
    ));

    Ok(Arc::new(Orchestrator::new(
        device_store,
        task_store,
        scheduled_store,
        execution_store,
        artifact_store,
        connection_pool,
        worker_pool,
        scheduler,
        clock,
        id_gen,
    )))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
