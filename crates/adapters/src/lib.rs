// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the Credential Vault and the Device Session
//! transports (SSH, Telnet, and a fake for tests).

pub mod session;
pub mod vault;

pub use session::{
    DeviceConnectInfo, DeviceSessionAdapter, MultiProtocolAdapter, ReadBudget, SessionError,
    SessionHandle, SessionTimeouts, SshAdapter, TelnetAdapter,
};
pub use vault::{CredentialDecryptError, CredentialVault, VaultMode};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use session::{FakeSessionAdapter, ScriptedCommand, SessionCall};
