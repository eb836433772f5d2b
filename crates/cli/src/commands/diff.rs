// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `netcfg diff` -- unified-diff comparison of two captures.

use anyhow::{Context, Result};
use clap::Args;
use netcfg_core::BackupTaskId;
use netcfg_daemon::lifecycle::ProdOrchestrator;
use netcfg_engine::CompareOptions;

use crate::output::OutputFormat;

#[derive(Args)]
pub struct DiffArgs {
    task_a: String,
    task_b: String,
    /// Case-insensitive comparison
    #[arg(long)]
    ignore_case: bool,
    /// Treat all-whitespace line differences as equal
    #[arg(long)]
    no_ignore_whitespace: bool,
}

pub async fn handle(args: DiffArgs, orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    let options = CompareOptions {
        ignore_whitespace: !args.no_ignore_whitespace,
        ignore_case: args.ignore_case,
    };
    let report = orchestrator
        .compare_tasks(&BackupTaskId::new(args.task_a), &BackupTaskId::new(args.task_b), options)
        .await
        .context("comparing tasks")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if let Some(err) = &report.error {
                println!("diff error: {err}");
                return Ok(());
            }
            if !report.summary.has_changes {
                println!("no changes");
                return Ok(());
            }
            println!(
                "+{} -{} ~{} ({} total)",
                report.summary.added, report.summary.removed, report.summary.modified, report.summary.total_changes
            );
            print!("{}", report.raw_diff);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
