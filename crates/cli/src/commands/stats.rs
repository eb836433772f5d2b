// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `netcfg stats` -- fleet-wide backup counters.

use anyhow::{Context, Result};
use netcfg_daemon::lifecycle::ProdOrchestrator;

use crate::output::OutputFormat;

pub async fn handle(orchestrator: &ProdOrchestrator, format: OutputFormat) -> Result<()> {
    let stats = orchestrator.statistics().await.context("fetching statistics")?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "total": stats.total,
                "success": stats.success,
                "failed": stats.failed,
                "running": stats.running,
                "total_bytes": stats.total_bytes,
                "success_rate": stats.success_rate,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("total:        {}", stats.total);
            println!("success:      {}", stats.success);
            println!("failed:       {}", stats.failed);
            println!("running:      {}", stats.running);
            println!("total bytes:  {}", stats.total_bytes);
            println!("success rate: {:.1}%", stats.success_rate * 100.0);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
