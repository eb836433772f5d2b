// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tracing-subscriber` setup: an `EnvFilter` honoring `RUST_LOG` (falling
//! back to `LOG_LEVEL`/`NETCFG_LOG_LEVEL`, default `info`) and a non-blocking
//! writer — a file appender when `NETCFG_LOG_PATH` is set, stdout otherwise
//! (spec §4.10).

use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn default_level() -> String {
    std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("NETCFG_LOG_LEVEL"))
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| "info".to_string())
}

/// Installs the global subscriber. Returns the `WorkerGuard` that must be
/// held for the process lifetime so buffered log lines are flushed on exit.
pub fn setup(log_path: Option<&Path>) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_new(default_level()).unwrap_or_else(|_| EnvFilter::new("info"));

    let (non_blocking, guard) = match log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("NETCFG_LOG_PATH has no file name: {}", path.display()))?;
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            tracing_appender::non_blocking(appender)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
