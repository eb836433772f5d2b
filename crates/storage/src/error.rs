// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the Task Store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("duplicate ip_address: {0}")]
    DuplicateIpAddress(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("task is already claimed")]
    Busy,
    #[error("invalid stored value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}
