// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Pool: bounded-parallelism executor that drains pending backup
//! tasks, enforcing per-device serialization (via the Connection Pool) and
//! a global concurrency ceiling (spec §4.6).

use std::sync::Arc;
use std::time::Duration;

use netcfg_adapters::{DeviceConnectInfo, DeviceSessionAdapter, SessionError, SessionTimeouts};
use netcfg_core::{
    BackupLogId, BackupTaskId, Clock, Device, DeviceId, IdGen, LastBackupStatus, LogLevel, TaskStatus,
};
use netcfg_storage::{ClaimOutcome, DeviceStore, TaskStore};
use tokio::sync::Semaphore;
use tracing::warn;

use crate::artifact::ArtifactStore;
use crate::pool::ConnectionPool;

/// Bounded-parallelism executor. `max_concurrent` caps the number of tasks
/// in the `execute` phase at any instant (spec §4.6, §8 global cap invariant).
pub struct WorkerPool<A: DeviceSessionAdapter, C: Clock, I: IdGen, V> {
    device_store: Arc<DeviceStore>,
    task_store: Arc<TaskStore>,
    connection_pool: Arc<ConnectionPool<A>>,
    artifact_store: Arc<ArtifactStore>,
    clock: C,
    id_gen: I,
    vault: V,
    semaphore: Arc<Semaphore>,
    session_timeouts: SessionTimeouts,
    /// Overall ceiling on one `execute` call (spec §6 `BACKUP_TIMEOUT`),
    /// distinct from the four fixed session-phase timeouts in `SessionTimeouts`.
    backup_timeout: Duration,
    enable_diff: bool,
}

/// Decrypts device credentials into session-ready connect info. Kept
/// abstract so the worker pool doesn't hardcode the vault type.
pub trait CredentialResolver: Clone + Send + Sync + 'static {
    fn resolve(&self, device: &Device) -> Result<DeviceConnectInfo, String>;
}

/// Production `CredentialResolver`: decrypts device passwords with the
/// process-wide Credential Vault.
#[derive(Clone)]
pub struct VaultCredentialResolver {
    vault: netcfg_adapters::CredentialVault,
}

impl VaultCredentialResolver {
    pub fn new(vault: netcfg_adapters::CredentialVault) -> Self {
        Self { vault }
    }
}

impl CredentialResolver for VaultCredentialResolver {
    fn resolve(&self, device: &Device) -> Result<DeviceConnectInfo, String> {
        let password = self
            .vault
            .decrypt(&device.password_encrypted)
            .map_err(|e| e.to_string())?;
        let enable_password = device
            .enable_password_encrypted
            .as_deref()
            .map(|ct| self.vault.decrypt(ct).map_err(|e| e.to_string()))
            .transpose()?;
        Ok(DeviceConnectInfo {
            ip_address: device.ip_address.clone(),
            port: device.port,
            protocol: device.protocol,
            device_type: device.device_type,
            username: device.username.clone(),
            password,
            enable_password,
        })
    }
}

impl<A, C, I, V> WorkerPool<A, C, I, V>
where
    A: DeviceSessionAdapter,
    C: Clock + Clone,
    I: IdGen,
    V: CredentialResolver,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device_store: Arc<DeviceStore>,
        task_store: Arc<TaskStore>,
        connection_pool: Arc<ConnectionPool<A>>,
        artifact_store: Arc<ArtifactStore>,
        clock: C,
        id_gen: I,
        vault: V,
        max_concurrent: usize,
        session_timeouts: SessionTimeouts,
        backup_timeout: Duration,
        enable_diff: bool,
    ) -> Self {
        Self {
            device_store,
            task_store,
            connection_pool,
            artifact_store,
            clock,
            id_gen,
            vault,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            session_timeouts,
            backup_timeout,
            enable_diff,
        }
    }

    /// Spawns the task's execution pipeline on the tokio runtime and
    /// returns immediately (spec §4.6: `submit` does not await completion).
    pub fn submit(self: &Arc<Self>, task_id: BackupTaskId)
    where
        A: 'static,
        C: 'static,
        I: 'static,
        V: 'static,
    {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            pool.run_task(task_id).await;
        });
    }

    /// Inserts one pending task per device, then submits each (spec §4.6
    /// batch submission). Returns the new task ids immediately.
    pub async fn submit_batch(
        self: &Arc<Self>,
        device_ids: &[DeviceId],
        submitter_id: &str,
        task_type: netcfg_core::TaskType,
        command_override: Option<&str>,
    ) -> Result<Vec<BackupTaskId>, netcfg_storage::StorageError>
    where
        A: 'static,
        C: 'static,
        I: 'static,
        V: 'static,
    {
        let mut task_ids = Vec::with_capacity(device_ids.len());
        for device_id in device_ids {
            let device = self.device_store.get(device_id).await?;
            if !device.active {
                continue;
            }
            let command = command_override.unwrap_or(&device.default_command).to_string();
            let task_id = BackupTaskId::new(self.id_gen.next());
            self.task_store
                .insert_task(
                    task_id.clone(),
                    device_id.clone(),
                    submitter_id,
                    task_type,
                    command,
                    netcfg_core::BackupTask::DEFAULT_MAX_RETRIES,
                    self.clock.now(),
                )
                .await?;
            task_ids.push(task_id.clone());
            self.submit(task_id);
        }
        Ok(task_ids)
    }

    /// One task's full pipeline (spec §4.6 steps 1-9). Never panics the
    /// pool: every error path finalizes the task as failed.
    async fn run_task(&self, task_id: BackupTaskId) {
        let _permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let task = match self.task_store.get(&task_id).await {
            Ok(t) => t,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "task not found, cannot run");
                return;
            }
        };
        let device = match self.device_store.get(&task.device_id).await {
            Ok(d) => d,
            Err(e) => {
                self.finalize_failed(&task_id, format!("device not found: {e}")).await;
                return;
            }
        };

        match self.task_store.claim(&task_id, self.clock.now()).await {
            Ok(ClaimOutcome::Claimed) => {}
            Ok(ClaimOutcome::Busy) => {
                // Another worker already has it; not an error.
                return;
            }
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "claim failed");
                return;
            }
        }

        self.log(&task_id, LogLevel::Info, format!("starting backup of {}", device.ip_address))
            .await;

        let connect_info = match self.vault.resolve(&device) {
            Ok(info) => info,
            Err(e) => {
                self.log(&task_id, LogLevel::Error, format!("credential error: {e}")).await;
                self.finalize_failed(&task_id, "cannot decrypt device credentials".to_string()).await;
                self.record_device_outcome(&device.id, LastBackupStatus::Failed).await;
                return;
            }
        };

        let mut guard = match self
            .connection_pool
            .acquire(device.id.as_str(), &connect_info, self.session_timeouts)
            .await
        {
            Ok(g) => g,
            Err(e) => {
                self.log(&task_id, LogLevel::Error, format!("connection error: {e}")).await;
                self.finalize_failed(&task_id, "cannot establish device connection".to_string()).await;
                self.record_device_outcome(&device.id, LastBackupStatus::Failed).await;
                return;
            }
        };

        let output = match tokio::time::timeout(self.backup_timeout, guard.execute(&task.effective_command)).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) => {
                self.log(&task_id, LogLevel::Error, format!("execute failed: {e}")).await;
                guard.dispose_on_error().await;
                self.finalize_failed(&task_id, e.to_string()).await;
                self.record_device_outcome(&device.id, LastBackupStatus::Failed).await;
                return;
            }
            Err(_) => {
                let timeout_err = SessionError::TimeoutError { phase: "execute" };
                self.log(&task_id, LogLevel::Error, format!("execute timed out after {}s", self.backup_timeout.as_secs()))
                    .await;
                guard.dispose_on_error().await;
                self.finalize_failed(&task_id, timeout_err.to_string()).await;
                self.record_device_outcome(&device.id, LastBackupStatus::Failed).await;
                return;
            }
        };
        guard.release();

        let started_at = self.clock.now();
        let persisted = match self.artifact_store.persist(
            &device.slug(),
            started_at,
            &task.effective_command,
            &output,
        ) {
            Ok(p) => p,
            Err(e) => {
                self.log(&task_id, LogLevel::Error, format!("artifact write failed: {e}")).await;
                self.finalize_failed(&task_id, format!("storage error: {e}")).await;
                self.record_device_outcome(&device.id, LastBackupStatus::Failed).await;
                return;
            }
        };

        let completed_at = self.clock.now();
        if let Err(e) = self
            .task_store
            .finalize(
                &task_id,
                TaskStatus::Success,
                Some(persisted.path.display().to_string()),
                Some(persisted.size_bytes),
                Some(persisted.sha256.clone()),
                None,
                completed_at,
            )
            .await
        {
            warn!(task_id = %task_id, error = %e, "failed to finalize successful task");
            return;
        }
        self.record_device_outcome(&device.id, LastBackupStatus::Success).await;
        self.log(&task_id, LogLevel::Info, "backup completed successfully").await;

        if self.enable_diff {
            self.diff_against_prior(&device, &task_id, &persisted.path, &output).await;
        }
    }

    /// Fire-and-forget comparison against the most recent prior successful
    /// artifact for this device (spec §4.6 step 8).
    async fn diff_against_prior(
        &self,
        device: &Device,
        task_id: &BackupTaskId,
        current_path: &std::path::Path,
        current_content: &str,
    ) {
        let prior = match self
            .task_store
            .latest_successful_excluding(&device.id, task_id)
            .await
        {
            Ok(Some(prior)) => prior,
            Ok(None) => return,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "could not look up prior artifact for diff");
                return;
            }
        };
        let Some(prior_path) = prior.artifact_path.as_ref() else {
            return;
        };
        let prior_content = match self.artifact_store.read_text(std::path::Path::new(prior_path)) {
            Ok(c) => c,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "could not read prior artifact for diff");
                return;
            }
        };
        if let Err(e) = self.artifact_store.write_diff(
            &format!("{}_{}", device.slug(), prior.id),
            &prior_content,
            &format!("{}_{}", device.slug(), task_id),
            current_content,
            current_path,
        ) {
            warn!(task_id = %task_id, error = %e, "diff generation failed");
        }
    }

    async fn finalize_failed(&self, task_id: &BackupTaskId, error_message: String) {
        let completed_at = self.clock.now();
        if let Err(e) = self
            .task_store
            .finalize(task_id, TaskStatus::Failed, None, None, None, Some(error_message), completed_at)
            .await
        {
            warn!(task_id = %task_id, error = %e, "failed to finalize failed task");
        }
    }

    async fn record_device_outcome(&self, device_id: &DeviceId, status: LastBackupStatus) {
        if let Err(e) = self
            .device_store
            .record_backup_outcome(device_id, self.clock.now(), status)
            .await
        {
            warn!(device_id = %device_id, error = %e, "failed to record device backup outcome");
        }
    }

    async fn log(&self, task_id: &BackupTaskId, level: LogLevel, message: impl Into<String>) {
        let log_id = BackupLogId::new(self.id_gen.next());
        let now = self.clock.now();
        if let Err(e) = self.task_store.append_log(log_id, task_id, level, message, now).await {
            warn!(task_id = %task_id, error = %e, "failed to append task log");
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
