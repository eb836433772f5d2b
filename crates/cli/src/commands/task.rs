// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `netcfg task` -- inspecting backup task state and history.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use netcfg_core::{BackupTaskId, DeviceId};
use netcfg_daemon::lifecycle::ProdOrchestrator;

use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Show one task's row plus its recent log lines
    Status { task_id: String },
    /// List the most recent tasks across all devices
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        /// Restrict to one device
        #[arg(long)]
        device_id: Option<String>,
    },
}

pub async fn handle(command: TaskCommand, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    match command {
        TaskCommand::Status { task_id } => status(task_id, orchestrator, format).await,
        TaskCommand::List { limit, device_id } => list(limit, device_id, orchestrator, format).await,
    }
}

async fn status(task_id: String, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    let view = orchestrator
        .task_status(&BackupTaskId::new(task_id))
        .await
        .context("fetching task status")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&(&view.task, &view.recent_logs))?),
        OutputFormat::Text => {
            println!("{} {} {}", view.task.id, view.task.device_id, view.task.status.as_str());
            println!("command: {}", view.task.effective_command);
            if let Some(msg) = &view.task.error_message {
                println!("error: {msg}");
            }
            for log in &view.recent_logs {
                println!("  [{}] {}", log.level.as_str(), log.message);
            }
        }
    }
    Ok(())
}

async fn list(limit: i64, device_id: Option<String>, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    let tasks = match device_id {
        Some(id) => orchestrator.tasks_for_device(&DeviceId::new(id)).await,
        None => orchestrator.recent_tasks(limit).await,
    }
    .context("listing tasks")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::left("ID"),
                Column::left("DEVICE"),
                Column::status("STATUS"),
                Column::left("TYPE"),
            ]);
            for task in &tasks {
                table.row(vec![
                    task.id.short(8).to_string(),
                    task.device_id.short(8).to_string(),
                    task.status.as_str().to_string(),
                    task.task_type.as_str().to_string(),
                ]);
            }
            let mut out = std::io::stdout();
            table.render(&mut out);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
