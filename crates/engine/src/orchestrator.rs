// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator: the single façade both `netcfgd` and the `netcfg` CLI call
//! into (spec §4.8). It owns no state of its own — every verb reads or
//! writes through the Task/Device/Scheduled stores and the Connection/Worker
//! Pool, so the CLI and daemon can open the same SQLite file side by side
//! without a socket between them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use netcfg_adapters::DeviceSessionAdapter;
use netcfg_core::{
    BackupLog, BackupTask, BackupTaskId, Clock, Device, DeviceId, IdGen, ScheduledTask,
    ScheduledTaskId, TaskExecution, TaskType,
};
use netcfg_storage::{DeviceStore, ScheduledTaskStore, TaskExecutionStore, TaskStore};

use crate::artifact::{ArtifactStore, CompareOptions, DiffReport};
use crate::error::OrchestratorError;
use crate::pool::ConnectionPool;
use crate::scheduler::Scheduler;
use crate::worker::{CredentialResolver, WorkerPool};

/// `task_status` response (spec §4.8): the task row plus its log tail.
#[derive(Debug, Clone)]
pub struct TaskStatusView {
    pub task: BackupTask,
    pub recent_logs: Vec<BackupLog>,
}

/// `statistics` response (spec §4.8).
#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics {
    pub total: i64,
    pub success: i64,
    pub failed: i64,
    pub running: i64,
    pub total_bytes: i64,
    pub success_rate: f64,
}

pub struct Orchestrator<A: DeviceSessionAdapter, C: Clock, I: IdGen, V: CredentialResolver> {
    device_store: Arc<DeviceStore>,
    task_store: Arc<TaskStore>,
    scheduled_store: Arc<ScheduledTaskStore>,
    execution_store: Arc<TaskExecutionStore>,
    artifact_store: Arc<ArtifactStore>,
    connection_pool: Arc<ConnectionPool<A>>,
    worker_pool: Arc<WorkerPool<A, C, I, V>>,
    scheduler: Arc<Scheduler<A, C, I, V>>,
    clock: C,
    id_gen: I,
}

impl<A, C, I, V> Orchestrator<A, C, I, V>
where
    A: DeviceSessionAdapter + 'static,
    C: Clock + Clone + 'static,
    I: IdGen + 'static,
    V: CredentialResolver + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device_store: Arc<DeviceStore>,
        task_store: Arc<TaskStore>,
        scheduled_store: Arc<ScheduledTaskStore>,
        execution_store: Arc<TaskExecutionStore>,
        artifact_store: Arc<ArtifactStore>,
        connection_pool: Arc<ConnectionPool<A>>,
        worker_pool: Arc<WorkerPool<A, C, I, V>>,
        scheduler: Arc<Scheduler<A, C, I, V>>,
        clock: C,
        id_gen: I,
    ) -> Self {
        Self {
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
        }
    }

    // ---- Device registry -------------------------------------------------

    /// Registers a device, encrypting `password`/`enable_password` with
    /// `vault` before the row is ever written (spec §3: only ciphertext is
    /// ever persisted).
    #[allow(clippy::too_many_arguments)]
    pub async fn register_device(
        &self,
        alias: Option<String>,
        ip_address: String,
        port: u16,
        protocol: netcfg_core::Protocol,
        device_type: netcfg_core::DeviceType,
        username: String,
        password_encrypted: String,
        enable_password_encrypted: Option<String>,
        default_command: String,
    ) -> Result<Device, OrchestratorError> {
        let now = self.clock.now();
        let device = Device {
            id: DeviceId::new(self.id_gen.next()),
            alias,
            ip_address,
            port,
            protocol,
            device_type,
            username,
            password_encrypted,
            enable_password_encrypted,
            default_command,
            active: true,
            created_at: now,
            updated_at: now,
            last_backup_at: None,
            last_backup_status: None,
        };
        self.device_store.insert(&device).await?;
        Ok(device)
    }

    pub async fn get_device(&self, device_id: &DeviceId) -> Result<Device, OrchestratorError> {
        Ok(self.device_store.get(device_id).await?)
    }

    pub async fn list_devices(&self, active_only: bool) -> Result<Vec<Device>, OrchestratorError> {
        Ok(self.device_store.list(active_only).await?)
    }

    /// Refuses to deactivate a device with tasks still referencing it, so
    /// artifact history never dangles off a vanished registration.
    pub async fn deactivate_device(&self, device_id: &DeviceId) -> Result<(), OrchestratorError> {
        let task_count = self.device_store.task_count(device_id).await?;
        if task_count != 0 {
            return Err(OrchestratorError::InvalidRequest(format!(
                "device {device_id} has {task_count} backup task(s); cannot deactivate"
            )));
        }
        self.device_store.deactivate(device_id).await?;
        Ok(())
    }

    // ---- Backup execution --------------------------------------------------

    /// Submits one immediate backup (spec §4.8 `backup_single`). Rejects
    /// inactive devices up front rather than letting the worker discover it.
    pub async fn backup_single(
        &self,
        device_id: &DeviceId,
        submitter_id: &str,
        command: Option<&str>,
    ) -> Result<BackupTaskId, OrchestratorError> {
        let device = self.device_store.get(device_id).await?;
        if !device.active {
            return Err(OrchestratorError::InvalidRequest(format!("device {device_id} is inactive")));
        }
        let effective_command = command.unwrap_or(&device.default_command).to_string();
        let task_id = BackupTaskId::new(self.id_gen.next());
        self.task_store
            .insert_task(
                task_id.clone(),
                device_id.clone(),
                submitter_id,
                TaskType::Manual,
                effective_command,
                BackupTask::DEFAULT_MAX_RETRIES,
                self.clock.now(),
            )
            .await?;
        self.worker_pool.submit(task_id.clone());
        Ok(task_id)
    }

    /// Submits one task per active device in `device_ids` (spec §4.8
    /// `backup_batch`); inactive devices are silently skipped by the worker
    /// pool's own batch submission.
    pub async fn backup_batch(
        &self,
        device_ids: &[DeviceId],
        submitter_id: &str,
        command: Option<&str>,
    ) -> Result<Vec<BackupTaskId>, OrchestratorError> {
        Ok(self
            .worker_pool
            .submit_batch(device_ids, submitter_id, TaskType::Batch, command)
            .await?)
    }

    pub async fn task_status(&self, task_id: &BackupTaskId) -> Result<TaskStatusView, OrchestratorError> {
        let task = self.task_store.get(task_id).await?;
        let recent_logs = self.task_store.logs_for_task(task_id).await?;
        Ok(TaskStatusView { task, recent_logs })
    }

    pub async fn recent_tasks(&self, limit: i64) -> Result<Vec<BackupTask>, OrchestratorError> {
        Ok(self.task_store.recent_tasks(limit).await?)
    }

    pub async fn tasks_for_device(&self, device_id: &DeviceId) -> Result<Vec<BackupTask>, OrchestratorError> {
        Ok(self.task_store.tasks_for_device(device_id).await?)
    }

    pub async fn history(&self, page: i64, per_page: i64) -> Result<Vec<BackupTask>, OrchestratorError> {
        Ok(self.task_store.history(page, per_page).await?)
    }

    pub async fn statistics(&self) -> Result<Statistics, OrchestratorError> {
        let stats = self.task_store.stats().await?;
        Ok(Statistics {
            total: stats.total,
            success: stats.success,
            failed: stats.failed,
            running: stats.running,
            total_bytes: stats.total_bytes,
            success_rate: stats.success_rate(),
        })
    }

    /// Resolves a completed task's artifact on disk plus the suggested
    /// download filename `<alias_or_ip>_<yyyymmdd_HHMMSS>_backup.txt` (spec
    /// §4.8 `download_artifact`).
    pub async fn download_artifact(&self, task_id: &BackupTaskId) -> Result<(PathBuf, String), OrchestratorError> {
        let task = self.task_store.get(task_id).await?;
        let artifact_path = task
            .artifact_path
            .ok_or_else(|| OrchestratorError::NotFound(format!("task {task_id} has no artifact")))?;
        let device = self.device_store.get(&task.device_id).await?;
        let timestamp = task
            .started_at
            .unwrap_or(task.created_at)
            .format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{timestamp}_backup.txt", device.slug());
        Ok((PathBuf::from(artifact_path), filename))
    }

    /// Deletes a task row and best-effort unlinks its artifact and sibling
    /// `.diff` file; the row deletion cascades to `backup_logs`.
    pub async fn delete_task(&self, task_id: &BackupTaskId) -> Result<(), OrchestratorError> {
        let task = self.task_store.get(task_id).await?;
        if let Some(path) = &task.artifact_path {
            let artifact_path = Path::new(path);
            let _ = std::fs::remove_file(artifact_path);
            let _ = std::fs::remove_file(artifact_path.with_extension("diff"));
        }
        self.task_store.delete(task_id).await?;
        Ok(())
    }

    // ---- Diffing ------------------------------------------------------------

    pub async fn compare_tasks(
        &self,
        task_a: &BackupTaskId,
        task_b: &BackupTaskId,
        options: CompareOptions,
    ) -> Result<DiffReport, OrchestratorError> {
        let (path_a, path_b) = self.artifact_pair(task_a, task_b).await?;
        Ok(self.artifact_store.compare(&path_a, &path_b, options))
    }

    /// Compares a device's two most recent successful captures, newest vs.
    /// previous (spec §4.8 `compare_latest_two`).
    pub async fn compare_latest_two(
        &self,
        device_id: &DeviceId,
        options: CompareOptions,
    ) -> Result<DiffReport, OrchestratorError> {
        let (older, newer) = self.latest_two_paths(device_id).await?;
        Ok(self.artifact_store.compare(&older, &newer, options))
    }

    /// Cheap line-count-only variant of [`Self::compare_latest_two`] (spec
    /// §4.8 `compare_latest_two_quick`).
    pub async fn compare_latest_two_quick(&self, device_id: &DeviceId) -> Result<DiffReport, OrchestratorError> {
        let (older, newer) = self.latest_two_paths(device_id).await?;
        Ok(self.artifact_store.compare_quick(&older, &newer))
    }

    async fn artifact_pair(
        &self,
        task_a: &BackupTaskId,
        task_b: &BackupTaskId,
    ) -> Result<(PathBuf, PathBuf), OrchestratorError> {
        let a = self.task_store.get(task_a).await?;
        let b = self.task_store.get(task_b).await?;
        let path_a = a
            .artifact_path
            .ok_or_else(|| OrchestratorError::InvalidRequest(format!("task {task_a} has no artifact")))?;
        let path_b = b
            .artifact_path
            .ok_or_else(|| OrchestratorError::InvalidRequest(format!("task {task_b} has no artifact")))?;
        Ok((PathBuf::from(path_a), PathBuf::from(path_b)))
    }

    async fn latest_two_paths(&self, device_id: &DeviceId) -> Result<(PathBuf, PathBuf), OrchestratorError> {
        let tasks = self.task_store.latest_two_successful(device_id).await?;
        if tasks.len() < 2 {
            return Err(OrchestratorError::InvalidRequest(format!(
                "device {device_id} has fewer than two successful captures"
            )));
        }
        let newer = &tasks[0];
        let older = &tasks[1];
        let older_path = older
            .artifact_path
            .clone()
            .ok_or_else(|| OrchestratorError::InvalidRequest(format!("task {} has no artifact", older.id)))?;
        let newer_path = newer
            .artifact_path
            .clone()
            .ok_or_else(|| OrchestratorError::InvalidRequest(format!("task {} has no artifact", newer.id)))?;
        Ok((PathBuf::from(older_path), PathBuf::from(newer_path)))
    }

    // ---- Scheduling ---------------------------------------------------------

    pub async fn install_schedule(&self, task: ScheduledTask) -> Result<ScheduledTask, OrchestratorError> {
        self.scheduler.install(task).await
    }

    pub async fn uninstall_schedule(&self, id: &ScheduledTaskId) -> Result<(), OrchestratorError> {
        self.scheduler.uninstall(id).await
    }

    pub async fn list_schedules(&self) -> Result<Vec<ScheduledTask>, OrchestratorError> {
        Ok(self.scheduled_store.list_active().await?)
    }

    /// Schedule fires still in flight, for operator visibility into which
    /// `TaskExecution`s haven't yet reconciled (spec §4.7).
    pub async fn running_executions(&self) -> Result<Vec<TaskExecution>, OrchestratorError> {
        Ok(self.execution_store.list_running().await?)
    }

    // ---- Lifecycle ------------------------------------------------------------

    /// Runs one scheduler tick. Called by the daemon's own interval loop
    /// (spec §4.7); exposed here so the CLI can also trigger an immediate
    /// tick for manual testing.
    pub async fn tick_scheduler(&self) {
        self.scheduler.tick().await;
    }

    /// Closes every idle pooled session (spec §4.5 sweep). Called
    /// periodically by the daemon alongside `tick_scheduler`.
    pub async fn sweep_idle_connections(&self, max_idle: std::time::Duration) {
        self.connection_pool.sweep_idle(max_idle).await;
    }

    /// Orderly shutdown: closes every open device session. The daemon calls
    /// this only after the scheduler has stopped firing and the worker pool
    /// has drained (spec §5 shutdown order).
    pub async fn shutdown(&self) {
        self.connection_pool.shutdown().await;
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
