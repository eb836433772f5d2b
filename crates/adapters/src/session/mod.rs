// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device Session: a single authenticated CLI session to one network device,
//! reached over SSH or Telnet. One trait, two real transports, plus a fake.

mod multi;
mod ssh;
mod telnet;

pub use multi::MultiProtocolAdapter;
pub use ssh::SshAdapter;
pub use telnet::TelnetAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSessionAdapter, ScriptedCommand, SessionCall};

use async_trait::async_trait;
use netcfg_core::{DeviceType, Protocol};
use std::time::Duration;
use thiserror::Error;

/// Errors from device session operations (spec §7).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("authentication rejected by device: {0}")]
    AuthError(String),
    #[error("timed out waiting for {phase}")]
    TimeoutError { phase: &'static str },
    #[error("transport error: {0}")]
    TransportError(String),
    #[error("device unreachable: {0}")]
    UnreachableError(String),
    #[error("session not open")]
    NotOpen,
}

/// Connection timeouts, in seconds per spec §4.2.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimeouts {
    pub connect: Duration,
    pub auth: Duration,
    pub banner: Duration,
    pub session: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(60),
            auth: Duration::from_secs(60),
            banner: Duration::from_secs(30),
            session: Duration::from_secs(120),
        }
    }
}

/// Everything a transport needs to open a session, decrypted and resolved
/// ahead of time by the caller (the Credential Vault never touches this module).
#[derive(Debug, Clone)]
pub struct DeviceConnectInfo {
    pub ip_address: String,
    pub port: u16,
    pub protocol: Protocol,
    pub device_type: DeviceType,
    pub username: String,
    pub password: String,
    pub enable_password: Option<String>,
}

/// Opaque handle to a live session, returned by `open` and passed back to
/// `execute`/`close`. Transports key their internal connection state on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub String);

impl SessionHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Read-loop delay-factor budget (spec §4.2): `show running-config*` gets a
/// 4x budget up to 2000 iterations; everything else gets 2x up to 500.
#[derive(Debug, Clone, Copy)]
pub struct ReadBudget {
    pub delay_factor: u32,
    pub max_iterations: u32,
}

impl ReadBudget {
    pub fn for_command(command: &str) -> Self {
        let normalized = command.trim().to_ascii_lowercase();
        if normalized.starts_with("show running-config") {
            ReadBudget {
                delay_factor: 4,
                max_iterations: 2000,
            }
        } else {
            ReadBudget {
                delay_factor: 2,
                max_iterations: 500,
            }
        }
    }
}

/// A single authenticated CLI session to one device (spec §4.2). Not safe
/// for concurrent `execute` on the same handle; the Connection Pool
/// serializes access per device.
#[async_trait]
pub trait DeviceSessionAdapter: Send + Sync + 'static {
    /// Establishes the transport, authenticates, and optionally enters
    /// privileged mode. The adapter applies the `device_type`'s pagination
    /// hint (e.g. `terminal length 0`), when one is known, once per session.
    async fn open(
        &self,
        info: &DeviceConnectInfo,
        timeouts: SessionTimeouts,
    ) -> Result<SessionHandle, SessionError>;

    /// Issues a single command and returns its captured stdout. If the
    /// command starts with "show" and an enable password was configured at
    /// `open` time, the session enters privileged mode first (idempotent
    /// within the session).
    async fn execute(&self, handle: &SessionHandle, command: &str) -> Result<String, SessionError>;

    /// Releases transport resources. Idempotent.
    async fn close(&self, handle: &SessionHandle);
}

/// True for any command the spec treats as an enable-requiring "show" read.
pub fn requires_privileged_mode(command: &str) -> bool {
    command.trim_start().to_ascii_lowercase().starts_with("show")
}

/// `terminal length 0`-equivalent hint, sent once per session on devices
/// whose type is known to support it (spec §4.2: "implementation need not
/// implement advanced pager handling").
pub fn pagination_disable_command(device_type: DeviceType) -> Option<&'static str> {
    match device_type {
        DeviceType::CiscoIos
        | DeviceType::CiscoXe
        | DeviceType::CiscoIosTelnet
        | DeviceType::CiscoNxos => Some("terminal length 0"),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
