// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device registry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a registered device.
    pub struct DeviceId;
}

/// Transport used to reach a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ssh,
    Telnet,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Ssh => "ssh",
            Protocol::Telnet => "telnet",
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssh" => Ok(Protocol::Ssh),
            "telnet" => Ok(Protocol::Telnet),
            other => Err(format!("unknown protocol: {other}")),
        }
    }
}

/// Closed set of device CLI dialects the session layer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    CiscoIos,
    CiscoXe,
    CiscoNxos,
    CiscoIosTelnet,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::CiscoIos => "cisco_ios",
            DeviceType::CiscoXe => "cisco_xe",
            DeviceType::CiscoNxos => "cisco_nxos",
            DeviceType::CiscoIosTelnet => "cisco_ios_telnet",
        }
    }
}

impl std::str::FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cisco_ios" => Ok(DeviceType::CiscoIos),
            "cisco_xe" => Ok(DeviceType::CiscoXe),
            "cisco_nxos" => Ok(DeviceType::CiscoNxos),
            "cisco_ios_telnet" => Ok(DeviceType::CiscoIosTelnet),
            other => Err(format!("unknown device type: {other}")),
        }
    }
}

/// Most recent backup outcome recorded directly on the device row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastBackupStatus {
    Success,
    Failed,
}

impl LastBackupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LastBackupStatus::Success => "success",
            LastBackupStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for LastBackupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(LastBackupStatus::Success),
            "failed" => Ok(LastBackupStatus::Failed),
            other => Err(format!("unknown last backup status: {other}")),
        }
    }
}

/// A managed network device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub alias: Option<String>,
    pub ip_address: String,
    pub port: u16,
    pub protocol: Protocol,
    pub device_type: DeviceType,
    pub username: String,
    /// Vault ciphertext, never plaintext.
    pub password_encrypted: String,
    pub enable_password_encrypted: Option<String>,
    pub default_command: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_backup_at: Option<DateTime<Utc>>,
    pub last_backup_status: Option<LastBackupStatus>,
}

impl Device {
    /// Directory-safe name used for artifact paths: alias if set, else the IP
    /// with ':' replaced (so IPv6 literals don't create bogus path segments).
    pub fn slug(&self) -> String {
        match &self.alias {
            Some(alias) if !alias.is_empty() => alias.clone(),
            _ => self.ip_address.replace(':', "_"),
        }
    }

    pub fn default_port() -> u16 {
        22
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
