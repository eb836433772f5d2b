// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed store for `BackupTask` and its `BackupLog` children.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use netcfg_core::{
    BackupLog, BackupLogId, BackupTask, BackupTaskId, DeviceId, LogLevel, TaskStatus, TaskType,
};

use crate::devices::parse_ts;
use crate::error::StorageError;

pub struct TaskStore {
    pool: SqlitePool,
}

/// Outcome of an attempted `claim`: either the task is now ours (running),
/// or another worker already holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    Busy,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStats {
    pub total: i64,
    pub success: i64,
    pub failed: i64,
    pub running: i64,
    pub total_bytes: i64,
}

impl TaskStats {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64
        }
    }
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new task row with `status = pending`.
    pub async fn insert_task(
        &self,
        id: BackupTaskId,
        device_id: DeviceId,
        submitter_id: impl Into<String>,
        task_type: TaskType,
        effective_command: impl Into<String>,
        max_retries: i32,
        now: DateTime<Utc>,
    ) -> Result<BackupTask, StorageError> {
        let task = BackupTask {
            id,
            device_id,
            submitter_id: submitter_id.into(),
            task_type,
            status: TaskStatus::Pending,
            effective_command: effective_command.into(),
            artifact_path: None,
            artifact_size_bytes: None,
            artifact_sha256: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            error_message: None,
            retry_count: 0,
            max_retries,
        };
        sqlx::query(
            "INSERT INTO backup_tasks (
                id, device_id, submitter_id, task_type, status, effective_command,
                artifact_path, artifact_size_bytes, artifact_sha256, started_at,
                completed_at, created_at, error_message, retry_count, max_retries
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, NULL, NULL, NULL, ?7, NULL, 0, ?8)",
        )
        .bind(task.id.as_str())
        .bind(task.device_id.as_str())
        .bind(&task.submitter_id)
        .bind(task.task_type.as_str())
        .bind(task.status.as_str())
        .bind(&task.effective_command)
        .bind(task.created_at.to_rfc3339())
        .bind(task.max_retries as i64)
        .execute(&self.pool)
        .await?;
        Ok(task)
    }

    pub async fn get(&self, id: &BackupTaskId) -> Result<BackupTask, StorageError> {
        let row = sqlx::query("SELECT * FROM backup_tasks WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("task {id}")))?;
        row_to_task(&row)
    }

    /// Atomically transitions `pending -> running`, guarded by `WHERE status = 'pending'`
    /// so two claimers racing on the same task see exactly one success.
    pub async fn claim(
        &self,
        id: &BackupTaskId,
        started_at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, StorageError> {
        let result = sqlx::query(
            "UPDATE backup_tasks SET status = 'running', started_at = ?1 WHERE id = ?2 AND status = 'pending'",
        )
        .bind(started_at.to_rfc3339())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            Ok(ClaimOutcome::Busy)
        } else {
            Ok(ClaimOutcome::Claimed)
        }
    }

    /// Transitions `running -> terminal`, recording artifact metadata and/or error.
    #[allow(clippy::too_many_arguments)]
    pub async fn finalize(
        &self,
        id: &BackupTaskId,
        status: TaskStatus,
        artifact_path: Option<String>,
        artifact_size_bytes: Option<i64>,
        artifact_sha256: Option<String>,
        error_message: Option<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE backup_tasks SET
                status = ?1, artifact_path = ?2, artifact_size_bytes = ?3,
                artifact_sha256 = ?4, error_message = ?5, completed_at = ?6
             WHERE id = ?7",
        )
        .bind(status.as_str())
        .bind(&artifact_path)
        .bind(artifact_size_bytes)
        .bind(&artifact_sha256)
        .bind(&error_message)
        .bind(completed_at.to_rfc3339())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("task {id}")));
        }
        Ok(())
    }

    pub async fn append_log(
        &self,
        log_id: BackupLogId,
        task_id: &BackupTaskId,
        level: LogLevel,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO backup_logs (id, task_id, level, message, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(log_id.as_str())
        .bind(task_id.as_str())
        .bind(level.as_str())
        .bind(message.into())
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn logs_for_task(&self, task_id: &BackupTaskId) -> Result<Vec<BackupLog>, StorageError> {
        let rows = sqlx::query("SELECT * FROM backup_logs WHERE task_id = ?1 ORDER BY timestamp")
            .bind(task_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_log).collect()
    }

    pub async fn tasks_for_device(&self, device_id: &DeviceId) -> Result<Vec<BackupTask>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM backup_tasks WHERE device_id = ?1 ORDER BY created_at DESC",
        )
        .bind(device_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_task).collect()
    }

    pub async fn recent_tasks(&self, limit: i64) -> Result<Vec<BackupTask>, StorageError> {
        let rows = sqlx::query("SELECT * FROM backup_tasks ORDER BY created_at DESC LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_task).collect()
    }

    pub async fn history(&self, page: i64, per_page: i64) -> Result<Vec<BackupTask>, StorageError> {
        let offset = page.max(0) * per_page;
        let rows = sqlx::query(
            "SELECT * FROM backup_tasks ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_task).collect()
    }

    /// Most recent *prior* successful task for a device, excluding `exclude_id`,
    /// ordered by `completed_at` descending (spec §9 normalized diff-source query).
    pub async fn latest_successful_excluding(
        &self,
        device_id: &DeviceId,
        exclude_id: &BackupTaskId,
    ) -> Result<Option<BackupTask>, StorageError> {
        let row = sqlx::query(
            "SELECT * FROM backup_tasks
             WHERE device_id = ?1 AND status = 'success' AND id != ?2 AND artifact_path IS NOT NULL
             ORDER BY completed_at DESC LIMIT 1",
        )
        .bind(device_id.as_str())
        .bind(exclude_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_task).transpose()
    }

    /// Most recent two successful tasks for a device, newest first.
    pub async fn latest_two_successful(
        &self,
        device_id: &DeviceId,
    ) -> Result<Vec<BackupTask>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM backup_tasks
             WHERE device_id = ?1 AND status = 'success' AND artifact_path IS NOT NULL
             ORDER BY completed_at DESC LIMIT 2",
        )
        .bind(device_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_task).collect()
    }

    pub async fn delete(&self, id: &BackupTaskId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM backup_tasks WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("task {id}")));
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<TaskStats, StorageError> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) AS total,
                SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END) AS success,
                SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END) AS failed,
                SUM(CASE WHEN status = 'running' THEN 1 ELSE 0 END) AS running,
                SUM(CASE WHEN status = 'success' THEN artifact_size_bytes ELSE 0 END) AS total_bytes
             FROM backup_tasks",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(TaskStats {
            total: row.try_get::<i64, _>("total")?,
            success: row.try_get::<Option<i64>, _>("success")?.unwrap_or(0),
            failed: row.try_get::<Option<i64>, _>("failed")?.unwrap_or(0),
            running: row.try_get::<Option<i64>, _>("running")?.unwrap_or(0),
            total_bytes: row.try_get::<Option<i64>, _>("total_bytes")?.unwrap_or(0),
        })
    }

    /// Count of tasks currently `running`, used to assert the global concurrency cap.
    pub async fn running_count(&self) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM backup_tasks WHERE status = 'running'")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?)
    }
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<BackupTask, StorageError> {
    let task_type_str: String = row.try_get("task_type")?;
    let status_str: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let started_at: Option<String> = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;

    Ok(BackupTask {
        id: BackupTaskId::new(row.try_get::<String, _>("id")?),
        device_id: DeviceId::new(row.try_get::<String, _>("device_id")?),
        submitter_id: row.try_get("submitter_id")?,
        task_type: TaskType::from_str(&task_type_str)
            .map_err(|_| StorageError::InvalidValue { field: "task_type", value: task_type_str })?,
        status: TaskStatus::from_str(&status_str)
            .map_err(|_| StorageError::InvalidValue { field: "status", value: status_str })?,
        effective_command: row.try_get("effective_command")?,
        artifact_path: row.try_get("artifact_path")?,
        artifact_size_bytes: row.try_get("artifact_size_bytes")?,
        artifact_sha256: row.try_get("artifact_sha256")?,
        started_at: started_at.map(|s| parse_ts(&s, "started_at")).transpose()?,
        completed_at: completed_at.map(|s| parse_ts(&s, "completed_at")).transpose()?,
        created_at: parse_ts(&created_at, "created_at")?,
        error_message: row.try_get("error_message")?,
        retry_count: row.try_get::<i64, _>("retry_count")? as i32,
        max_retries: row.try_get::<i64, _>("max_retries")? as i32,
    })
}

fn row_to_log(row: &sqlx::sqlite::SqliteRow) -> Result<BackupLog, StorageError> {
    let level_str: String = row.try_get("level")?;
    let timestamp: String = row.try_get("timestamp")?;
    Ok(BackupLog {
        id: BackupLogId::new(row.try_get::<String, _>("id")?),
        task_id: BackupTaskId::new(row.try_get::<String, _>("task_id")?),
        level: LogLevel::from_str(&level_str)
            .map_err(|_| StorageError::InvalidValue { field: "level", value: level_str })?,
        message: row.try_get("message")?,
        timestamp: parse_ts(&timestamp, "timestamp")?,
    })
}
