// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `netcfgd`: the background process that owns the backup execution engine.
//!
//! Opens the SQLite pool, builds the Connection Pool / Worker Pool /
//! Scheduler behind one `Orchestrator`, and ticks the scheduler and idle
//! session sweep on an interval until a shutdown signal arrives (spec §2,
//! §5).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod logging;

pub use lifecycle::{build, LifecycleError, ProdOrchestrator};
