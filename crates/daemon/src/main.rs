// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network configuration backup daemon (netcfgd).
//!
//! Background process that owns the backup execution engine: it builds the
//! Connection Pool / Worker Pool / Scheduler behind one `Orchestrator`
//! (spec §2) and drives the scheduler's tick loop until asked to stop.

use std::sync::Arc;

use netcfg_daemon::lifecycle::ProdOrchestrator;
use netcfg_engine::EngineConfig;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("netcfgd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: netcfgd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = EngineConfig::from_env();
    let _log_guard = netcfg_daemon::logging::setup(netcfg_daemon::env::log_path().as_deref())?;

    info!(
        max_concurrent_backups = config.max_concurrent_backups,
        database_url = %config.database_url,
        "starting netcfgd"
    );

    let orchestrator = netcfg_daemon::build(&config).await?;

    run(orchestrator, &config).await?;

    info!("netcfgd stopped");
    Ok(())
}

async fn run(orchestrator: Arc<ProdOrchestrator>, config: &EngineConfig) -> anyhow::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let tick_interval = netcfg_daemon::env::tick_interval();
    let idle_timeout = netcfg_daemon::env::idle_session_timeout();
    let mut ticker = tokio::time::interval(tick_interval);

    info!(
        tick_interval_secs = tick_interval.as_secs(),
        "netcfgd ready"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                orchestrator.tick_scheduler().await;
                orchestrator.sweep_idle_connections(idle_timeout).await;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    // Shutdown order (spec §5): the scheduler loop above is already
    // stopped (no new fires), so only the Connection Pool needs closing.
    // In-flight worker tasks hold their own Arc clones of the pool and
    // finish or time out on their own; we don't block waiting for them.
    if config.max_concurrent_backups == 0 {
        warn!("max_concurrent_backups is 0; no backups can run");
    }
    orchestrator.shutdown().await;
    Ok(())
}

fn print_help() {
    println!("netcfgd {}", env!("CARGO_PKG_VERSION"));
    println!("Network configuration backup daemon");
    println!();
    println!("USAGE:");
    println!("    netcfgd");
    println!();
    println!("Runs until SIGTERM/SIGINT. Configuration is read entirely from the");
    println!("environment (DATABASE_URL, MAX_CONCURRENT_BACKUPS, ENCRYPTION_KEY, ...);");
    println!("see the operator guide for the full list.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
