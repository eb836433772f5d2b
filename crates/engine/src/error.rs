// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the backup execution engine.

use netcfg_adapters::SessionError;
use netcfg_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the Connection Pool and Worker Pool.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("device not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("artifact storage error: {0}")]
    Artifact(String),
    #[error("vault error: {0}")]
    Vault(String),
    #[error("concurrency guard: session busy")]
    Busy,
}

/// Errors surfaced by `Scheduler::validate`/`next_fire_time`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("cron expression must have exactly five fields: {0}")]
    WrongFieldCount(String),
    #[error("invalid {field} field {value:?}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("no fire time found for {0} within the search horizon")]
    Unsatisfiable(String),
}

/// Errors surfaced by Orchestrator verbs, carrying a stable string the
/// (out-of-scope) HTTP layer uses to build `{success, error}` responses.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("io error: {0}")]
    Io(String),
}
