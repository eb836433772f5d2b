// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed device registry.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use netcfg_core::{Device, DeviceId, DeviceType, LastBackupStatus, Protocol};

use crate::error::StorageError;

/// Durable store for registered devices.
pub struct DeviceStore {
    pool: SqlitePool,
}

impl DeviceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new device. Fails with `StorageError::DuplicateIpAddress` if
    /// `ip_address` is already registered (spec §3 uniqueness invariant).
    pub async fn insert(&self, device: &Device) -> Result<(), StorageError> {
        let existing = sqlx::query("SELECT id FROM devices WHERE ip_address = ?1")
            .bind(&device.ip_address)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(StorageError::DuplicateIpAddress(device.ip_address.clone()));
        }

        sqlx::query(
            "INSERT INTO devices (
                id, alias, ip_address, port, protocol, device_type, username,
                password_encrypted, enable_password_encrypted, default_command,
                active, created_at, updated_at, last_backup_at, last_backup_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(device.id.as_str())
        .bind(&device.alias)
        .bind(&device.ip_address)
        .bind(device.port as i64)
        .bind(device.protocol.as_str())
        .bind(device.device_type.as_str())
        .bind(&device.username)
        .bind(&device.password_encrypted)
        .bind(&device.enable_password_encrypted)
        .bind(&device.default_command)
        .bind(device.active)
        .bind(device.created_at.to_rfc3339())
        .bind(device.updated_at.to_rfc3339())
        .bind(device.last_backup_at.map(|t| t.to_rfc3339()))
        .bind(device.last_backup_status.map(|s| s.as_str()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &DeviceId) -> Result<Device, StorageError> {
        let row = sqlx::query("SELECT * FROM devices WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("device {id}")))?;
        row_to_device(&row)
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<Device>, StorageError> {
        let rows = if active_only {
            sqlx::query("SELECT * FROM devices WHERE active = 1 ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query("SELECT * FROM devices ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?
        };
        rows.iter().map(row_to_device).collect()
    }

    /// Updates only `last_backup_at`/`last_backup_status`, the one mutation
    /// the engine itself is allowed to make to a Device row.
    pub async fn record_backup_outcome(
        &self,
        id: &DeviceId,
        at: DateTime<Utc>,
        status: LastBackupStatus,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE devices SET last_backup_at = ?1, last_backup_status = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(at.to_rfc3339())
        .bind(status.as_str())
        .bind(at.to_rfc3339())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("device {id}")));
        }
        Ok(())
    }

    /// Soft-deletes a device (sets `active = 0`). The API layer is
    /// responsible for refusing this while open tasks reference the device;
    /// this store only performs the flip.
    pub async fn deactivate(&self, id: &DeviceId) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE devices SET active = 0 WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("device {id}")));
        }
        Ok(())
    }

    /// Count of backup tasks still referencing this device, used by callers
    /// to enforce the "no cascade while tasks exist" deletion rule.
    pub async fn task_count(&self, id: &DeviceId) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM backup_tasks WHERE device_id = ?1")
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")?)
    }
}

fn row_to_device(row: &sqlx::sqlite::SqliteRow) -> Result<Device, StorageError> {
    let protocol_str: String = row.try_get("protocol")?;
    let device_type_str: String = row.try_get("device_type")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let last_backup_at: Option<String> = row.try_get("last_backup_at")?;
    let last_backup_status: Option<String> = row.try_get("last_backup_status")?;

    Ok(Device {
        id: DeviceId::new(row.try_get::<String, _>("id")?),
        alias: row.try_get("alias")?,
        ip_address: row.try_get("ip_address")?,
        port: row.try_get::<i64, _>("port")? as u16,
        protocol: Protocol::from_str(&protocol_str)
            .map_err(|_| StorageError::InvalidValue { field: "protocol", value: protocol_str })?,
        device_type: DeviceType::from_str(&device_type_str).map_err(|_| StorageError::InvalidValue {
            field: "device_type",
            value: device_type_str,
        })?,
        username: row.try_get("username")?,
        password_encrypted: row.try_get("password_encrypted")?,
        enable_password_encrypted: row.try_get("enable_password_encrypted")?,
        default_command: row.try_get("default_command")?,
        active: row.try_get("active")?,
        created_at: parse_ts(&created_at, "created_at")?,
        updated_at: parse_ts(&updated_at, "updated_at")?,
        last_backup_at: last_backup_at
            .map(|s| parse_ts(&s, "last_backup_at"))
            .transpose()?,
        last_backup_status: last_backup_status
            .map(|s| {
                LastBackupStatus::from_str(&s)
                    .map_err(|_| StorageError::InvalidValue { field: "last_backup_status", value: s })
            })
            .transpose()?,
    })
}

pub(crate) fn parse_ts(s: &str, field: &'static str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidValue { field, value: s.to_string() })
}
