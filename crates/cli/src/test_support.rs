// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for command tests: a throwaway SQLite file plus a fully
//! wired [`ProdOrchestrator`], matching `netcfg-daemon`'s own
//! `lifecycle_tests.rs` fixture shape.

use std::sync::Arc;

use netcfg_daemon::lifecycle::ProdOrchestrator;
use netcfg_engine::EngineConfig;

pub async fn build_test_orchestrator() -> (tempfile::TempDir, Arc<ProdOrchestrator>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("netcfg.db");
    let mut config = EngineConfig::default();
    config.database_url = format!("sqlite://{}", db_path.display());
    config.artifact_root = dir.path().join("backups");

    let orchestrator = netcfg_daemon::build(&config).await.expect("lifecycle build succeeds");
    (dir, orchestrator)
}
