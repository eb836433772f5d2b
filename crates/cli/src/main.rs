// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! netcfg - operator CLI for the network configuration backup engine.
//!
//! Talks directly to the same SQLite file `netcfgd` uses (spec §4.11); there
//! is no socket between the two, so the CLI works whether or not the daemon
//! process is currently running.

mod color;
mod commands;
mod output;
mod table;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use netcfg_daemon::lifecycle::ProdOrchestrator;
use netcfg_engine::EngineConfig;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "netcfg",
    version,
    about = "Operator CLI for the network configuration backup engine"
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register and list devices
    Device(commands::device::DeviceArgs),
    /// Run backups, single or batch
    Backup(commands::backup::BackupArgs),
    /// Inspect backup task state
    Task(commands::task::TaskArgs),
    /// Compare two captures
    Diff(commands::diff::DiffArgs),
    /// Manage recurring backup jobs
    Schedule(commands::schedule::ScheduleArgs),
    /// Fleet-wide counters
    Stats,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", format_error(&e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    let orchestrator: Arc<ProdOrchestrator> = netcfg_daemon::build(&config).await?;

    match cli.command {
        Commands::Device(args) => commands::device::handle(args.command, &orchestrator, cli.output).await,
        Commands::Backup(args) => commands::backup::handle(args.command, &orchestrator, cli.output).await,
        Commands::Task(args) => commands::task::handle(args.command, &orchestrator, cli.output).await,
        Commands::Diff(args) => commands::diff::handle(args, &orchestrator, cli.output).await,
        Commands::Schedule(args) => commands::schedule::handle(args.command, &orchestrator, cli.output).await,
        Commands::Stats => commands::stats::handle(&orchestrator, cli.output).await,
    }
}

/// Format an anyhow error, deduplicating the chain: if the top-level
/// `Display` already contains every source error's text (common with
/// `thiserror` `#[from]` variants), skip the redundant "Caused by" trail.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err.chain().skip(1).all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }
    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
