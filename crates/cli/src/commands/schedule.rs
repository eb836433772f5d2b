// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `netcfg schedule` -- recurring backup jobs (spec §4.7).

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use netcfg_core::{Clock, DeviceId, FrequencyConfig, IdGen, ScheduledTask, ScheduledTaskId, SystemClock, TaskType, UuidIdGen};
use netcfg_daemon::lifecycle::ProdOrchestrator;

use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// Install a recurring job
    Add(AddArgs),
    /// List active recurring jobs
    List,
    /// Uninstall a recurring job
    Remove { schedule_id: String },
}

#[derive(Args)]
pub struct AddArgs {
    /// Human-readable job name
    #[arg(long)]
    name: String,
    /// Device ids to back up on each fire
    #[arg(long = "device", required = true)]
    device_ids: Vec<String>,
    /// Command override; defaults to each device's own default command
    #[arg(long, default_value = "show running-config")]
    command: String,
    #[command(subcommand)]
    frequency: Frequency,
}

#[derive(Subcommand)]
pub enum Frequency {
    /// Once a day, at the given hour:minute
    Daily {
        #[arg(long, default_value_t = 2)]
        hour: u32,
        #[arg(long, default_value_t = 0)]
        minute: u32,
    },
    /// Once a week, on the given weekday (0=Sunday)
    Weekly {
        #[arg(long)]
        weekday: u32,
        #[arg(long, default_value_t = 2)]
        hour: u32,
        #[arg(long, default_value_t = 0)]
        minute: u32,
    },
    /// Once a month, on the given day-of-month
    Monthly {
        #[arg(long)]
        day: u32,
        #[arg(long, default_value_t = 2)]
        hour: u32,
        #[arg(long, default_value_t = 0)]
        minute: u32,
    },
    /// Raw five-field cron expression
    Custom { cron: String },
}

impl From<Frequency> for FrequencyConfig {
    fn from(f: Frequency) -> Self {
        match f {
            Frequency::Daily { hour, minute } => FrequencyConfig::Daily { hour, minute },
            Frequency::Weekly { weekday, hour, minute } => FrequencyConfig::Weekly { weekday, hour, minute },
            Frequency::Monthly { day, hour, minute } => FrequencyConfig::Monthly { day, hour, minute },
            Frequency::Custom { cron } => FrequencyConfig::Custom { cron },
        }
    }
}

pub async fn handle(command: ScheduleCommand, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    match command {
        ScheduleCommand::Add(args) => add(args, orchestrator, format).await,
        ScheduleCommand::List => list(orchestrator, format).await,
        ScheduleCommand::Remove { schedule_id } => remove(schedule_id, orchestrator).await,
    }
}

async fn add(args: AddArgs, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    let id_gen = UuidIdGen;
    let target_device_ids: Vec<DeviceId> = args.device_ids.into_iter().map(DeviceId::new).collect();
    let task = ScheduledTask::new(
        ScheduledTaskId::new(id_gen.next()),
        args.name,
        TaskType::Scheduled,
        args.frequency.into(),
        target_device_ids,
        args.command,
        "cli",
        SystemClock.now(),
    );

    let installed = orchestrator.install_schedule(task).await.context("installing schedule")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&installed)?),
        OutputFormat::Text => println!(
            "installed schedule {} ({}), next run at {}",
            installed.id,
            installed.cron_expression,
            installed
                .next_run_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        ),
    }
    Ok(())
}

async fn list(orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    let schedules = orchestrator.list_schedules().await.context("listing schedules")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schedules)?),
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::left("ID"),
                Column::left("NAME"),
                Column::left("CRON"),
                Column::left("NEXT RUN"),
            ]);
            for job in &schedules {
                table.row(vec![
                    job.id.short(8).to_string(),
                    job.name.clone(),
                    job.cron_expression.clone(),
                    job.next_run_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string()),
                ]);
            }
            let mut out = std::io::stdout();
            table.render(&mut out);
        }
    }
    Ok(())
}

async fn remove(schedule_id: String, orchestrator: &ProdOrchestrator) -> Result<()> {
    orchestrator
        .uninstall_schedule(&ScheduledTaskId::new(schedule_id))
        .await
        .context("removing schedule")?;
    println!("schedule removed");
    Ok(())
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
