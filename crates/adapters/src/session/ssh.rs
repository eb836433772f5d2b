// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH `DeviceSessionAdapter`: password auth over `russh`, with `enable`
//! escalation driven over the same interactive shell channel.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use russh::client::{self, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use tokio::time::timeout;

use super::{
    pagination_disable_command, requires_privileged_mode, DeviceConnectInfo, DeviceSessionAdapter,
    ReadBudget, SessionError, SessionHandle, SessionTimeouts,
};

/// Base per-iteration pause in the read-until-idle loop; scaled by
/// `ReadBudget::delay_factor`.
const BASE_ITERATION_DELAY: Duration = Duration::from_millis(50);
/// Consecutive idle iterations (no new bytes) before the read loop considers
/// the device done, rather than burning the full iteration budget.
const IDLE_ROUNDS_TO_STOP: u32 = 3;

struct Entry {
    session: client::Handle<Handler>,
    channel: Channel<Msg>,
    enable_password: Option<String>,
    entered_privileged: bool,
}

/// SSH transport for the Device Session contract.
#[derive(Clone, Default)]
pub struct SshAdapter {
    sessions: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<Entry>>>>>,
}

impl SshAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

struct Handler;

#[async_trait]
impl client::Handler for Handler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Fleet devices typically carry self-signed or rotating host keys;
        // this layer authenticates the operator's password, not the host.
        Ok(true)
    }
}

#[async_trait]
impl DeviceSessionAdapter for SshAdapter {
    async fn open(
        &self,
        info: &DeviceConnectInfo,
        timeouts: SessionTimeouts,
    ) -> Result<SessionHandle, SessionError> {
        let addr: SocketAddr = format!("{}:{}", info.ip_address, info.port)
            .parse()
            .map_err(|e| SessionError::UnreachableError(format!("invalid address: {e}")))?;

        let config = Arc::new(client::Config {
            inactivity_timeout: Some(timeouts.session),
            ..Default::default()
        });

        let mut session = timeout(timeouts.connect, client::connect(config, addr, Handler))
            .await
            .map_err(|_| SessionError::TimeoutError { phase: "connect" })?
            .map_err(|e| SessionError::UnreachableError(e.to_string()))?;

        let authenticated = timeout(
            timeouts.auth,
            session.authenticate_password(&info.username, &info.password),
        )
        .await
        .map_err(|_| SessionError::TimeoutError { phase: "auth" })?
        .map_err(|e| SessionError::TransportError(e.to_string()))?;

        if !authenticated {
            return Err(SessionError::AuthError(format!(
                "password rejected for {}",
                info.username
            )));
        }

        let mut channel = timeout(timeouts.banner, session.channel_open_session())
            .await
            .map_err(|_| SessionError::TimeoutError { phase: "banner" })?
            .map_err(|e| SessionError::TransportError(e.to_string()))?;

        channel
            .request_pty(false, "vt100", 300, 80, 0, 0, &[])
            .await
            .map_err(|e| SessionError::TransportError(e.to_string()))?;
        channel
            .request_shell(true)
            .await
            .map_err(|e| SessionError::TransportError(e.to_string()))?;

        // Drain the initial banner/MOTD before issuing any commands.
        let _ = read_until_idle(&mut channel, ReadBudget::for_command(""), timeouts.banner).await;

        if let Some(hint) = pagination_disable_command(info.device_type) {
            write_line(&mut channel, hint)
                .await
                .map_err(|e| SessionError::TransportError(e.to_string()))?;
            let _ = read_until_idle(&mut channel, ReadBudget::for_command(hint), timeouts.session).await;
        }

        let handle = SessionHandle(uuid::Uuid::new_v4().to_string());
        self.sessions.lock().insert(
            handle.as_str().to_string(),
            Arc::new(tokio::sync::Mutex::new(Entry {
                session,
                channel,
                enable_password: info.enable_password.clone(),
                entered_privileged: false,
            })),
        );
        Ok(handle)
    }

    async fn execute(&self, handle: &SessionHandle, command: &str) -> Result<String, SessionError> {
        let entry = self
            .sessions
            .lock()
            .get(handle.as_str())
            .cloned()
            .ok_or(SessionError::NotOpen)?;
        let mut guard = entry.lock().await;

        if requires_privileged_mode(command) && !guard.entered_privileged {
            if let Some(secret) = guard.enable_password.clone() {
                write_line(&mut guard.channel, "enable")
                    .await
                    .map_err(|e| SessionError::TransportError(e.to_string()))?;
                let _ = read_until_idle(
                    &mut guard.channel,
                    ReadBudget {
                        delay_factor: 2,
                        max_iterations: 20,
                    },
                    Duration::from_secs(10),
                )
                .await;
                write_line(&mut guard.channel, &secret)
                    .await
                    .map_err(|e| SessionError::TransportError(e.to_string()))?;
                let _ = read_until_idle(
                    &mut guard.channel,
                    ReadBudget {
                        delay_factor: 2,
                        max_iterations: 20,
                    },
                    Duration::from_secs(10),
                )
                .await;
                guard.entered_privileged = true;
            }
        }

        write_line(&mut guard.channel, command)
            .await
            .map_err(|e| SessionError::TransportError(e.to_string()))?;

        let budget = ReadBudget::for_command(command);
        let output = read_until_idle(&mut guard.channel, budget, Duration::from_secs(300)).await?;
        Ok(strip_echo(&output, command))
    }

    async fn close(&self, handle: &SessionHandle) {
        if let Some(entry) = self.sessions.lock().remove(handle.as_str()) {
            let mut guard = entry.lock().await;
            let _ = guard
                .session
                .disconnect(Disconnect::ByApplication, "", "en")
                .await;
        }
    }
}

async fn write_line(channel: &mut Channel<Msg>, line: &str) -> Result<(), russh::Error> {
    let mut payload = Vec::with_capacity(line.len() + 1);
    payload.extend_from_slice(line.as_bytes());
    payload.push(b'\n');
    channel.data(&payload[..]).await
}

/// Reads from `channel` until no new data has arrived for
/// `IDLE_ROUNDS_TO_STOP` consecutive polls, or the iteration budget is spent.
async fn read_until_idle(
    channel: &mut Channel<Msg>,
    budget: ReadBudget,
    overall_timeout: Duration,
) -> Result<String, SessionError> {
    let mut output = String::new();
    let mut idle_rounds = 0u32;
    let per_iteration = BASE_ITERATION_DELAY * budget.delay_factor;

    let result = timeout(overall_timeout, async {
        for _ in 0..budget.max_iterations {
            match timeout(per_iteration, channel.wait()).await {
                Ok(Some(ChannelMsg::Data { data })) => {
                    output.push_str(&String::from_utf8_lossy(&data));
                    idle_rounds = 0;
                }
                Ok(Some(ChannelMsg::ExtendedData { data, .. })) => {
                    output.push_str(&String::from_utf8_lossy(&data));
                    idle_rounds = 0;
                }
                Ok(Some(ChannelMsg::Eof)) | Ok(Some(ChannelMsg::Close)) | Ok(None) => break,
                Ok(Some(_)) => {}
                Err(_) => {
                    idle_rounds += 1;
                    if idle_rounds >= IDLE_ROUNDS_TO_STOP {
                        break;
                    }
                }
            }
        }
    })
    .await;

    if result.is_err() {
        return Err(SessionError::TimeoutError { phase: "session" });
    }
    Ok(output)
}

/// Strips the echoed command line the device's CLI typically reflects back
/// before its own output.
fn strip_echo(output: &str, command: &str) -> String {
    let mut lines: Vec<&str> = output.lines().collect();
    if let Some(first) = lines.first() {
        if first.trim() == command.trim() {
            lines.remove(0);
        }
    }
    lines.join("\n")
}
