// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only structured log rows attached to a backup task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backup_task::BackupTaskId;

crate::define_id! {
    /// Unique identifier for a backup log row.
    pub struct BackupLogId;
}

/// Severity of a log row, mirroring `tracing::Level` without pulling in the dep here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// One append-only log row, inserted only by the engine during task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupLog {
    pub id: BackupLogId,
    pub task_id: BackupTaskId,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
