// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon binary. Engine-wide
//! settings (§6) live in `EngineConfig::from_env`; these are daemon-process-only.

use std::path::PathBuf;
use std::time::Duration;

/// Scheduler/idle-sweep tick interval, overridden by `NETCFG_TICK_INTERVAL_SECS`.
pub fn tick_interval() -> Duration {
    std::env::var("NETCFG_TICK_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30))
}

/// How long a pooled session may sit idle before the tick loop disposes it.
pub fn idle_session_timeout() -> Duration {
    std::env::var("NETCFG_IDLE_SESSION_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(900))
}

/// Optional log file path; falls back to stdout when unset.
pub fn log_path() -> Option<PathBuf> {
    std::env::var("NETCFG_LOG_PATH").ok().map(PathBuf::from)
}
