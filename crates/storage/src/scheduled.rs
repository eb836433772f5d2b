// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed stores for `ScheduledTask` and `TaskExecution`.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use netcfg_core::{
    DeviceId, FrequencyConfig, ScheduledTask, ScheduledTaskId, TaskExecution, TaskExecutionId,
    TaskExecutionStatus, TaskType,
};

use crate::devices::parse_ts;
use crate::error::StorageError;

pub struct ScheduledTaskStore {
    pool: SqlitePool,
}

impl ScheduledTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, task: &ScheduledTask) -> Result<(), StorageError> {
        let target_ids: Vec<&str> = task.target_device_ids.iter().map(|d| d.as_str()).collect();
        let freq_json = serde_json::to_string(&task.frequency_config)
            .map_err(|e| StorageError::InvalidValue { field: "frequency_config", value: e.to_string() })?;
        sqlx::query(
            "INSERT INTO scheduled_tasks (
                id, name, description, task_type, frequency_config, cron_expression,
                target_device_ids, capture_command, active, created_by, created_at,
                last_run_at, next_run_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(task.id.as_str())
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.task_type.as_str())
        .bind(freq_json)
        .bind(&task.cron_expression)
        .bind(serde_json::to_string(&target_ids).unwrap_or_else(|_| "[]".to_string()))
        .bind(&task.capture_command)
        .bind(task.active)
        .bind(&task.created_by)
        .bind(task.created_at.to_rfc3339())
        .bind(task.last_run_at.map(|t| t.to_rfc3339()))
        .bind(task.next_run_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &ScheduledTaskId) -> Result<ScheduledTask, StorageError> {
        let row = sqlx::query("SELECT * FROM scheduled_tasks WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("scheduled task {id}")))?;
        row_to_scheduled(&row)
    }

    pub async fn list_active(&self) -> Result<Vec<ScheduledTask>, StorageError> {
        let rows = sqlx::query("SELECT * FROM scheduled_tasks WHERE active = 1")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_scheduled).collect()
    }

    /// Updates the computed `next_run_at` (and `last_run_at` when a fire just happened).
    pub async fn update_run_times(
        &self,
        id: &ScheduledTaskId,
        last_run_at: Option<DateTime<Utc>>,
        next_run_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE scheduled_tasks SET last_run_at = ?1, next_run_at = ?2 WHERE id = ?3")
            .bind(last_run_at.map(|t| t.to_rfc3339()))
            .bind(next_run_at.map(|t| t.to_rfc3339()))
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("scheduled task {id}")));
        }
        Ok(())
    }

    pub async fn remove(&self, id: &ScheduledTaskId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM scheduled_tasks WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_scheduled(row: &sqlx::sqlite::SqliteRow) -> Result<ScheduledTask, StorageError> {
    let task_type_str: String = row.try_get("task_type")?;
    let freq_json: String = row.try_get("frequency_config")?;
    let target_json: String = row.try_get("target_device_ids")?;
    let created_at: String = row.try_get("created_at")?;
    let last_run_at: Option<String> = row.try_get("last_run_at")?;
    let next_run_at: Option<String> = row.try_get("next_run_at")?;

    let frequency_config: FrequencyConfig = serde_json::from_str(&freq_json)
        .map_err(|_| StorageError::InvalidValue { field: "frequency_config", value: freq_json })?;
    let target_ids: Vec<String> = serde_json::from_str(&target_json)
        .map_err(|_| StorageError::InvalidValue { field: "target_device_ids", value: target_json })?;

    Ok(ScheduledTask {
        id: ScheduledTaskId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        task_type: TaskType::from_str(&task_type_str)
            .map_err(|_| StorageError::InvalidValue { field: "task_type", value: task_type_str })?,
        frequency_config,
        cron_expression: row.try_get("cron_expression")?,
        target_device_ids: target_ids.into_iter().map(DeviceId::new).collect(),
        capture_command: row.try_get("capture_command")?,
        active: row.try_get("active")?,
        created_by: row.try_get("created_by")?,
        created_at: parse_ts(&created_at, "created_at")?,
        last_run_at: last_run_at.map(|s| parse_ts(&s, "last_run_at")).transpose()?,
        next_run_at: next_run_at.map(|s| parse_ts(&s, "next_run_at")).transpose()?,
    })
}

pub struct TaskExecutionStore {
    pool: SqlitePool,
}

impl TaskExecutionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn open(&self, execution: &TaskExecution) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO task_executions (id, scheduled_task_id, status, started_at, completed_at, result_summary, error_message, execution_log)
             VALUES (?1, ?2, ?3, ?4, NULL, NULL, NULL, ?5)",
        )
        .bind(execution.id.as_str())
        .bind(execution.scheduled_task_id.as_str())
        .bind(execution.status.as_str())
        .bind(execution.started_at.to_rfc3339())
        .bind(&execution.execution_log)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn close(&self, execution: &TaskExecution) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE task_executions SET status = ?1, completed_at = ?2, result_summary = ?3, error_message = ?4, execution_log = ?5 WHERE id = ?6",
        )
        .bind(execution.status.as_str())
        .bind(execution.completed_at.map(|t| t.to_rfc3339()))
        .bind(&execution.result_summary)
        .bind(&execution.error_message)
        .bind(&execution.execution_log)
        .bind(execution.id.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("task execution {}", execution.id)));
        }
        Ok(())
    }

    pub async fn get(&self, id: &TaskExecutionId) -> Result<TaskExecution, StorageError> {
        let row = sqlx::query("SELECT * FROM task_executions WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("task execution {id}")))?;
        row_to_execution(&row)
    }

    pub async fn list_running(&self) -> Result<Vec<TaskExecution>, StorageError> {
        let rows = sqlx::query("SELECT * FROM task_executions WHERE status = 'running'")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_execution).collect()
    }
}

fn row_to_execution(row: &sqlx::sqlite::SqliteRow) -> Result<TaskExecution, StorageError> {
    let status_str: String = row.try_get("status")?;
    let started_at: String = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;
    Ok(TaskExecution {
        id: TaskExecutionId::new(row.try_get::<String, _>("id")?),
        scheduled_task_id: ScheduledTaskId::new(row.try_get::<String, _>("scheduled_task_id")?),
        status: TaskExecutionStatus::from_str(&status_str)
            .map_err(|_| StorageError::InvalidValue { field: "status", value: status_str })?,
        started_at: parse_ts(&started_at, "started_at")?,
        completed_at: completed_at.map(|s| parse_ts(&s, "completed_at")).transpose()?,
        result_summary: row.try_get("result_summary")?,
        error_message: row.try_get("error_message")?,
        execution_log: row.try_get("execution_log")?,
    })
}
