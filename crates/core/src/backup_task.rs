// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The backup task lifecycle: `pending -> running -> {success, failed, cancelled}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceId;

crate::define_id! {
    /// Unique identifier for a backup task.
    pub struct BackupTaskId;
}

/// What triggered a backup task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Manual,
    Batch,
    Scheduled,
    Immediate,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Manual => "manual",
            TaskType::Batch => "batch",
            TaskType::Scheduled => "scheduled",
            TaskType::Immediate => "immediate",
        }
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(TaskType::Manual),
            "batch" => Ok(TaskType::Batch),
            "scheduled" => Ok(TaskType::Scheduled),
            "immediate" => Ok(TaskType::Immediate),
            other => Err(format!("unknown task type: {other}")),
        }
    }
}

/// Monotone task status DAG: `pending -> running -> {success, failed, cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// True once a task has left the pending/running states and cannot transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether `self -> next` is a legal edge in the status DAG.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Cancelled)
                | (
                    TaskStatus::Running,
                    TaskStatus::Success | TaskStatus::Failed | TaskStatus::Cancelled
                )
        )
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "success" => Ok(TaskStatus::Success),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// A single backup attempt against one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupTask {
    pub id: BackupTaskId,
    pub device_id: DeviceId,
    pub submitter_id: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub effective_command: String,
    pub artifact_path: Option<String>,
    pub artifact_size_bytes: Option<i64>,
    pub artifact_sha256: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
}

impl BackupTask {
    pub const DEFAULT_MAX_RETRIES: i32 = 3;

    /// Artifact completeness invariant (spec §8): success implies a fully
    /// populated artifact triple, and only success carries one.
    pub fn artifact_invariant_holds(&self) -> bool {
        let has_artifact = self.artifact_path.is_some()
            && self.artifact_size_bytes.is_some()
            && self.artifact_sha256.is_some();
        (self.status == TaskStatus::Success) == has_artifact
    }

    /// `started_at <= completed_at` invariant, vacuously true until both are set.
    pub fn timing_invariant_holds(&self) -> bool {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => started <= completed,
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "backup_task_tests.rs"]
mod tests;
