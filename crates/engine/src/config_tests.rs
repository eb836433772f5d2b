// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_env() {
    for key in [
        "MAX_CONCURRENT_BACKUPS",
        "BACKUP_TIMEOUT",
        "COMPRESS_BACKUPS",
        "ENABLE_DIFF",
        "DATABASE_URL",
        "NETCFG_ARTIFACT_ROOT",
        "NETCFG_SCHEDULER_TZ",
        "NETCFG_ENV",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial(engine_config_env)]
fn defaults_when_unset() {
    clear_env();
    let config = EngineConfig::from_env();
    assert_eq!(config.max_concurrent_backups, 10);
    assert_eq!(config.backup_timeout_secs, 300);
    assert!(!config.compress_backups);
    assert!(config.enable_diff);
    assert_eq!(config.database_url, "sqlite://netcfg.db");
    assert_eq!(config.vault_mode, VaultMode::Development);
    clear_env();
}

#[test]
#[serial(engine_config_env)]
fn reads_overrides_from_env() {
    clear_env();
    std::env::set_var("MAX_CONCURRENT_BACKUPS", "4");
    std::env::set_var("COMPRESS_BACKUPS", "true");
    std::env::set_var("NETCFG_ENV", "production");
    let config = EngineConfig::from_env();
    assert_eq!(config.max_concurrent_backups, 4);
    assert!(config.compress_backups);
    assert_eq!(config.vault_mode, VaultMode::Production);
    clear_env();
}
