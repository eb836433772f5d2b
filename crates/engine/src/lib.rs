// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! netcfg-engine: the backup execution engine (spec §2) — Connection Pool,
//! Artifact Store, Worker Pool, Scheduler, and the Orchestrator façade that
//! ties them to a durable Task Store.

pub mod artifact;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pool;
pub mod scheduler;
pub mod worker;

pub use artifact::{
    ArtifactError, ArtifactStore, ChangeTag, Change, CompareOptions, DiffReport, DiffSummary, Hunk,
    PersistedArtifact,
};
pub use config::EngineConfig;
pub use error::{EngineError, OrchestratorError, ScheduleError};
pub use orchestrator::{Orchestrator, Statistics, TaskStatusView};
pub use pool::{ConnectionGuard, ConnectionPool};
pub use scheduler::{next_fire_time, parse_timezone, validate, Scheduler, DEFAULT_TZ};
pub use worker::{CredentialResolver, VaultCredentialResolver, WorkerPool};
