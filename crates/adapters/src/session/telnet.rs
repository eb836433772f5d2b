// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telnet `DeviceSessionAdapter`. No mature async Telnet crate exists in
//! this stack, so this drives a raw `TcpStream`, negotiating just enough
//! RFC 854 IAC option handling (refuse everything offered) to talk to IOS's
//! telnet daemon, then follows the same username/password/enable prompt
//! sequence and read-loop budget as the SSH path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{
    pagination_disable_command, requires_privileged_mode, DeviceConnectInfo, DeviceSessionAdapter,
    ReadBudget, SessionError, SessionHandle, SessionTimeouts,
};

const BASE_ITERATION_DELAY: Duration = Duration::from_millis(50);
const IDLE_ROUNDS_TO_STOP: u32 = 3;

// Telnet protocol bytes (RFC 854).
const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;

struct Entry {
    stream: TcpStream,
    enable_password: Option<String>,
    entered_privileged: bool,
}

/// Telnet transport, selected when `Device.protocol == telnet`.
#[derive(Clone, Default)]
pub struct TelnetAdapter {
    sessions: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<Entry>>>>>,
}

impl TelnetAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceSessionAdapter for TelnetAdapter {
    async fn open(
        &self,
        info: &DeviceConnectInfo,
        timeouts: SessionTimeouts,
    ) -> Result<SessionHandle, SessionError> {
        let mut stream = timeout(
            timeouts.connect,
            TcpStream::connect((info.ip_address.as_str(), info.port)),
        )
        .await
        .map_err(|_| SessionError::TimeoutError { phase: "connect" })?
        .map_err(|e| SessionError::UnreachableError(e.to_string()))?;

        // Consume the initial IAC option negotiation, refusing every offer.
        let _ = timeout(timeouts.banner, negotiate_options(&mut stream)).await;

        wait_for_prompt(&mut stream, &["sername:", "ogin:"], timeouts.auth).await?;
        write_line(&mut stream, &info.username).await?;
        wait_for_prompt(&mut stream, &["assword:"], timeouts.auth).await?;
        write_line(&mut stream, &info.password).await?;

        let post_auth = timeout(
            timeouts.auth,
            read_until_idle(
                &mut stream,
                ReadBudget {
                    delay_factor: 2,
                    max_iterations: 30,
                },
            ),
        )
        .await
        .map_err(|_| SessionError::TimeoutError { phase: "auth" })?
        .unwrap_or_default();

        if post_auth.to_ascii_lowercase().contains("invalid")
            || post_auth.to_ascii_lowercase().contains("fail")
            || post_auth.to_ascii_lowercase().contains("denied")
        {
            return Err(SessionError::AuthError(format!(
                "password rejected for {}",
                info.username
            )));
        }

        if let Some(hint) = pagination_disable_command(info.device_type) {
            write_line(&mut stream, hint).await?;
            let _ = read_until_idle(&mut stream, ReadBudget::for_command(hint)).await;
        }

        let handle = SessionHandle(uuid::Uuid::new_v4().to_string());
        self.sessions.lock().insert(
            handle.as_str().to_string(),
            Arc::new(tokio::sync::Mutex::new(Entry {
                stream,
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
                write_line(&mut guard.stream, "enable").await?;
                let _ = wait_for_prompt(&mut guard.stream, &["assword:"], Duration::from_secs(10)).await;
                write_line(&mut guard.stream, &secret).await?;
                let _ = read_until_idle(
                    &mut guard.stream,
                    ReadBudget {
                        delay_factor: 2,
                        max_iterations: 20,
                    },
                )
                .await;
                guard.entered_privileged = true;
            }
        }

        write_line(&mut guard.stream, command).await?;
        let budget = ReadBudget::for_command(command);
        let output = timeout(Duration::from_secs(300), read_until_idle(&mut guard.stream, budget))
            .await
            .map_err(|_| SessionError::TimeoutError { phase: "session" })??;
        Ok(strip_echo(&output, command))
    }

    async fn close(&self, handle: &SessionHandle) {
        if let Some(entry) = self.sessions.lock().remove(handle.as_str()) {
            let mut guard = entry.lock().await;
            let _ = guard.stream.shutdown().await;
        }
    }
}

async fn write_line(stream: &mut TcpStream, line: &str) -> Result<(), SessionError> {
    stream
        .write_all(line.as_bytes())
        .await
        .map_err(|e| SessionError::TransportError(e.to_string()))?;
    stream
        .write_all(b"\r\n")
        .await
        .map_err(|e| SessionError::TransportError(e.to_string()))
}

/// Answers every IAC option request with a refusal (`DONT`/`WONT`), which is
/// enough to get past IOS's telnet daemon without implementing real option
/// negotiation.
async fn negotiate_options(stream: &mut TcpStream) -> Result<(), SessionError> {
    let mut buf = [0u8; 256];
    loop {
        let n = match timeout(Duration::from_millis(200), stream.read(&mut buf)).await {
            Ok(Ok(0)) | Err(_) => return Ok(()),
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(SessionError::TransportError(e.to_string())),
        };
        let mut i = 0;
        while i < n {
            if buf[i] == IAC && i + 2 < n {
                let (cmd, opt) = (buf[i + 1], buf[i + 2]);
                let reply = match cmd {
                    DO => [IAC, WONT, opt],
                    WILL => [IAC, DONT, opt],
                    _ => {
                        i += 3;
                        continue;
                    }
                };
                stream
                    .write_all(&reply)
                    .await
                    .map_err(|e| SessionError::TransportError(e.to_string()))?;
                i += 3;
            } else {
                i += 1;
            }
        }
    }
}

async fn wait_for_prompt(
    stream: &mut TcpStream,
    needles: &[&str],
    overall_timeout: Duration,
) -> Result<String, SessionError> {
    let mut collected = String::new();
    let mut buf = [0u8; 512];
    let result = timeout(overall_timeout, async {
        loop {
            let n = stream.read(&mut buf).await.map_err(|e| SessionError::TransportError(e.to_string()))?;
            if n == 0 {
                return Err(SessionError::TransportError("connection closed".to_string()));
            }
            collected.push_str(&String::from_utf8_lossy(&buf[..n]));
            if needles.iter().any(|needle| collected.contains(needle)) {
                return Ok(collected.clone());
            }
        }
    })
    .await;
    match result {
        Ok(inner) => inner,
        Err(_) => Err(SessionError::TimeoutError { phase: "auth" }),
    }
}

/// Reads until no new bytes arrive for `IDLE_ROUNDS_TO_STOP` consecutive
/// polls, or the iteration budget is spent.
async fn read_until_idle(stream: &mut TcpStream, budget: ReadBudget) -> Result<String, SessionError> {
    let mut output = String::new();
    let mut idle_rounds = 0u32;
    let mut buf = [0u8; 2048];
    let per_iteration = BASE_ITERATION_DELAY * budget.delay_factor;

    for _ in 0..budget.max_iterations {
        match timeout(per_iteration, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                output.push_str(&String::from_utf8_lossy(&buf[..n]));
                idle_rounds = 0;
            }
            Ok(Err(e)) => return Err(SessionError::TransportError(e.to_string())),
            Err(_) => {
                idle_rounds += 1;
                if idle_rounds >= IDLE_ROUNDS_TO_STOP {
                    break;
                }
            }
        }
    }
    Ok(output)
}

fn strip_echo(output: &str, command: &str) -> String {
    let mut lines: Vec<&str> = output.lines().collect();
    if let Some(first) = lines.first() {
        if first.trim() == command.trim() {
            lines.remove(0);
        }
    }
    lines.join("\n")
}
