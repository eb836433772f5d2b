// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `netcfg backup` -- submits tasks to the Worker Pool and waits for them to
//! land in a terminal state, so the command is useful without a separate
//! `netcfgd` process running alongside it.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use netcfg_core::{BackupTaskId, DeviceId, TaskStatus};
use netcfg_daemon::lifecycle::ProdOrchestrator;

use crate::output::OutputFormat;

#[derive(Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupCommand,
}

#[derive(Subcommand)]
pub enum BackupCommand {
    /// Run a single backup and wait for it to finish
    Run {
        device_id: String,
        /// Override the device's default capture command
        #[arg(long)]
        command: Option<String>,
    },
    /// Run one backup per device id and wait for all of them
    Batch {
        device_ids: Vec<String>,
        #[arg(long)]
        command: Option<String>,
    },
}

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const MAX_POLLS: u32 = 150; // ~30s ceiling; backup_timeout governs the worker side.

pub async fn handle(command: BackupCommand, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    match command {
        BackupCommand::Run { device_id, command } => {
            let task_id = orchestrator
                .backup_single(&DeviceId::new(device_id), "cli", command.as_deref())
                .await
                .context("submitting backup")?;
            let task = await_terminal(orchestrator, &task_id).await?;
            print_task(&task, format)
        }
        BackupCommand::Batch { device_ids, command } => {
            let ids: Vec<DeviceId> = device_ids.into_iter().map(DeviceId::new).collect();
            let task_ids = orchestrator
                .backup_batch(&ids, "cli", command.as_deref())
                .await
                .context("submitting batch backup")?;
            for task_id in &task_ids {
                let task = await_terminal(orchestrator, task_id).await?;
                print_task(&task, format)?;
            }
            Ok(())
        }
    }
}

async fn await_terminal(orchestrator: &ProdOrchestrator, task_id: &BackupTaskId) -> Result<netcfg_core::BackupTask> {
    for _ in 0..MAX_POLLS {
        let view = orchestrator.task_status(task_id).await.context("checking task status")?;
        if view.task.status.is_terminal() {
            return Ok(view.task);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    orchestrator
        .task_status(task_id)
        .await
        .map(|view| view.task)
        .context("checking task status")
}

fn print_task(task: &netcfg_core::BackupTask, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(task)?),
        OutputFormat::Text => {
            let status = if crate::output::should_use_color() {
                crate::color::status(task.status.as_str())
            } else {
                task.status.as_str().to_string()
            };
            match task.status {
                TaskStatus::Success => println!("{} {} -> {status}", task.id, task.device_id),
                _ => println!(
                    "{} {} -> {status}{}",
                    task.id,
                    task.device_id,
                    task.error_message
                        .as_deref()
                        .map(|m| format!(": {m}"))
                        .unwrap_or_default()
                ),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
