// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-driven engine configuration, resolved once at startup and
//! passed by reference into the pool/worker pool/scheduler constructors.

use std::path::PathBuf;

use netcfg_adapters::VaultMode;

/// Resolved engine configuration (spec §6).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_concurrent_backups: usize,
    pub backup_timeout_secs: u64,
    pub compress_backups: bool,
    pub enable_diff: bool,
    pub database_url: String,
    pub artifact_root: PathBuf,
    pub scheduler_tz: String,
    pub vault_mode: VaultMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_backups: 10,
            backup_timeout_secs: 300,
            compress_backups: false,
            enable_diff: true,
            database_url: "sqlite://netcfg.db".to_string(),
            artifact_root: PathBuf::from("backups"),
            scheduler_tz: "Asia/Shanghai".to_string(),
            vault_mode: VaultMode::Development,
        }
    }
}

impl EngineConfig {
    /// Resolves configuration from the environment, warning on each
    /// insecure default used, the same "resolve once, warn on fallback"
    /// shape the daemon's own config loading follows.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_concurrent_backups = env_usize("MAX_CONCURRENT_BACKUPS", defaults.max_concurrent_backups);
        let backup_timeout_secs = env_u64("BACKUP_TIMEOUT", defaults.backup_timeout_secs);
        let compress_backups = env_bool("COMPRESS_BACKUPS", defaults.compress_backups);
        let enable_diff = env_bool("ENABLE_DIFF", defaults.enable_diff);

        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            tracing::warn!(default = %defaults.database_url, "DATABASE_URL not set; using default");
            defaults.database_url.clone()
        });

        let artifact_root = std::env::var("NETCFG_ARTIFACT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| defaults.artifact_root.clone());

        let scheduler_tz = std::env::var("NETCFG_SCHEDULER_TZ").unwrap_or_else(|_| {
            defaults.scheduler_tz.clone()
        });

        let vault_mode = std::env::var("NETCFG_ENV")
            .map(|s| VaultMode::from_env_str(&s))
            .unwrap_or(VaultMode::Development);

        Self {
            max_concurrent_backups,
            backup_timeout_secs,
            compress_backups,
            enable_diff,
            database_url,
            artifact_root,
            scheduler_tz,
            vault_mode,
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
