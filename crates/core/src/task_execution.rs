// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregated per-fire run record for a `ScheduledTask`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduled_task::ScheduledTaskId;

crate::define_id! {
    /// Unique identifier for a scheduled task execution (one per fire).
    pub struct TaskExecutionId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl TaskExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskExecutionStatus::Running => "running",
            TaskExecutionStatus::Completed => "completed",
            TaskExecutionStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for TaskExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(TaskExecutionStatus::Running),
            "completed" => Ok(TaskExecutionStatus::Completed),
            "failed" => Ok(TaskExecutionStatus::Failed),
            other => Err(format!("unknown task execution status: {other}")),
        }
    }
}

/// One fire of a `ScheduledTask`, summarizing the batch of `BackupTask`s it spawned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecution {
    pub id: TaskExecutionId,
    pub scheduled_task_id: ScheduledTaskId,
    pub status: TaskExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result_summary: Option<String>,
    pub error_message: Option<String>,
    pub execution_log: String,
}

impl TaskExecution {
    pub fn open(
        id: TaskExecutionId,
        scheduled_task_id: ScheduledTaskId,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            scheduled_task_id,
            status: TaskExecutionStatus::Running,
            started_at,
            completed_at: None,
            result_summary: None,
            error_message: None,
            execution_log: String::new(),
        }
    }

    /// Summarizes and closes the execution given per-device outcomes.
    pub fn close(&mut self, completed_at: DateTime<Utc>, success_count: usize, failed_count: usize) {
        self.status = if failed_count == 0 {
            TaskExecutionStatus::Completed
        } else {
            TaskExecutionStatus::Failed
        };
        self.completed_at = Some(completed_at);
        self.result_summary = Some(format!("success {success_count}, failed {failed_count}"));
    }
}

#[cfg(test)]
#[path = "task_execution_tests.rs"]
mod tests;
