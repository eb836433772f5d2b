// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatches to [`SshAdapter`] or [`TelnetAdapter`] by `DeviceConnectInfo::protocol`
//! (spec §4.2/§6), so the Connection Pool can be built once for a fleet that
//! mixes both transports.

use async_trait::async_trait;
use netcfg_core::Protocol;

use super::{
    DeviceConnectInfo, DeviceSessionAdapter, SessionError, SessionHandle, SessionTimeouts,
    SshAdapter, TelnetAdapter,
};

/// Single real `DeviceSessionAdapter` used in production, routing each
/// device to its own declared transport. The session handle is tagged with
/// the protocol it was opened under so `execute`/`close` route back to the
/// same inner adapter without a second lookup table.
#[derive(Clone, Default)]
pub struct MultiProtocolAdapter {
    ssh: SshAdapter,
    telnet: TelnetAdapter,
}

impl MultiProtocolAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

const SSH_PREFIX: &str = "ssh:";
const TELNET_PREFIX: &str = "telnet:";

fn split_handle(handle: &SessionHandle) -> Result<(Protocol, SessionHandle), SessionError> {
    let raw = handle.as_str();
    if let Some(inner) = raw.strip_prefix(SSH_PREFIX) {
        Ok((Protocol::Ssh, SessionHandle(inner.to_string())))
    } else if let Some(inner) = raw.strip_prefix(TELNET_PREFIX) {
        Ok((Protocol::Telnet, SessionHandle(inner.to_string())))
    } else {
        Err(SessionError::NotOpen)
    }
}

#[async_trait]
impl DeviceSessionAdapter for MultiProtocolAdapter {
    async fn open(
        &self,
        info: &DeviceConnectInfo,
        timeouts: SessionTimeouts,
    ) -> Result<SessionHandle, SessionError> {
        match info.protocol {
            Protocol::Ssh => {
                let inner = self.ssh.open(info, timeouts).await?;
                Ok(SessionHandle(format!("{SSH_PREFIX}{}", inner.as_str())))
            }
            Protocol::Telnet => {
                let inner = self.telnet.open(info, timeouts).await?;
                Ok(SessionHandle(format!("{TELNET_PREFIX}{}", inner.as_str())))
            }
        }
    }

    async fn execute(&self, handle: &SessionHandle, command: &str) -> Result<String, SessionError> {
        let (protocol, inner) = split_handle(handle)?;
        match protocol {
            Protocol::Ssh => self.ssh.execute(&inner, command).await,
            Protocol::Telnet => self.telnet.execute(&inner, command).await,
        }
    }

    async fn close(&self, handle: &SessionHandle) {
        let Ok((protocol, inner)) = split_handle(handle) else {
            return;
        };
        match protocol {
            Protocol::Ssh => self.ssh.close(&inner).await,
            Protocol::Telnet => self.telnet.close(&inner).await,
        }
    }
}

#[cfg(test)]
#[path = "multi_tests.rs"]
mod tests;
