// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurring backup jobs: cron-derived fire times plus the structured intent
//! (daily/weekly/monthly/custom) the operator originally expressed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backup_task::TaskType;
use crate::device::DeviceId;

crate::define_id! {
    /// Unique identifier for a recurring scheduled task.
    pub struct ScheduledTaskId;
}

/// Structured operator intent, preserved for UI round-trip. `cron_expression`
/// on `ScheduledTask` is always the authoritative trigger derived from this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FrequencyConfig {
    Daily { hour: u32, minute: u32 },
    Weekly { weekday: u32, hour: u32, minute: u32 },
    Monthly { day: u32, hour: u32, minute: u32 },
    Custom { cron: String },
}

impl FrequencyConfig {
    /// Derives the authoritative five-field cron expression for this intent.
    pub fn to_cron_expression(&self) -> String {
        match self {
            FrequencyConfig::Daily { hour, minute } => format!("{minute} {hour} * * *"),
            FrequencyConfig::Weekly {
                weekday,
                hour,
                minute,
            } => format!("{minute} {hour} * * {weekday}"),
            FrequencyConfig::Monthly { day, hour, minute } => {
                format!("{minute} {hour} {day} * *")
            }
            FrequencyConfig::Custom { cron } => cron.clone(),
        }
    }

    pub fn frequency_type(&self) -> &'static str {
        match self {
            FrequencyConfig::Daily { .. } => "daily",
            FrequencyConfig::Weekly { .. } => "weekly",
            FrequencyConfig::Monthly { .. } => "monthly",
            FrequencyConfig::Custom { .. } => "custom",
        }
    }
}

/// A persistent recurring job. `cron_expression` is authoritative; `frequency_config`
/// is preserved only so the (out-of-scope) HTTP layer can round-trip the operator's intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: ScheduledTaskId,
    pub name: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub frequency_config: FrequencyConfig,
    pub cron_expression: String,
    pub target_device_ids: Vec<DeviceId>,
    pub capture_command: String,
    pub active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
}

impl ScheduledTask {
    /// Builds a new scheduled task, deriving `cron_expression` from `frequency_config`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ScheduledTaskId,
        name: impl Into<String>,
        task_type: TaskType,
        frequency_config: FrequencyConfig,
        target_device_ids: Vec<DeviceId>,
        capture_command: impl Into<String>,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let cron_expression = frequency_config.to_cron_expression();
        Self {
            id,
            name: name.into(),
            description: None,
            task_type,
            frequency_config,
            cron_expression,
            target_device_ids,
            capture_command: capture_command.into(),
            active: true,
            created_by: created_by.into(),
            created_at: now,
            last_run_at: None,
            next_run_at: None,
        }
    }
}

#[cfg(test)]
#[path = "scheduled_task_tests.rs"]
mod tests;
