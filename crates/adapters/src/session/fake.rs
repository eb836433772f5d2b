// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `DeviceSessionAdapter` used throughout the engine's own test
//! suite, exactly as the host codebase's fake session adapter is used by
//! its runtime tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DeviceConnectInfo, DeviceSessionAdapter, SessionError, SessionHandle, SessionTimeouts};

/// One recorded adapter call, for assertions in tests.
#[derive(Debug, Clone)]
pub enum SessionCall {
    Open { ip_address: String },
    Execute { handle: String, command: String },
    Close { handle: String },
}

/// A scripted response for one command, keyed by exact match.
#[derive(Debug, Clone)]
pub struct ScriptedCommand {
    pub command: String,
    pub output: String,
}

struct FakeState {
    calls: Vec<SessionCall>,
    open_handles: HashMap<String, String>, // handle -> ip_address
    next_id: u64,
    /// Per-ip scripted responses, consulted by exact command match.
    scripts: HashMap<String, Vec<ScriptedCommand>>,
    /// ip addresses whose `open` should fail with this error.
    auth_failures: HashMap<String, String>,
    execute_failures: HashMap<String, String>,
    /// Per-ip artificial delay applied inside `execute`, to give tests against
    /// per-device serialization something to actually overlap if it broke.
    execute_delays: HashMap<String, Duration>,
    /// Wall-clock (start, end) of each `execute` call, per ip, so tests can
    /// assert non-overlap independent of the (possibly fake) task-level clock.
    execute_windows: HashMap<String, Vec<(Instant, Instant)>>,
}

/// Fake session adapter: records calls, returns scripted output.
#[derive(Clone)]
pub struct FakeSessionAdapter {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeSessionAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                open_handles: HashMap::new(),
                next_id: 0,
                scripts: HashMap::new(),
                auth_failures: HashMap::new(),
                execute_failures: HashMap::new(),
                execute_delays: HashMap::new(),
                execute_windows: HashMap::new(),
            })),
        }
    }
}

impl FakeSessionAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SessionCall> {
        self.inner.lock().calls.clone()
    }

    /// Scripts `output` to be returned for an exact `command` match against `ip_address`.
    pub fn script(&self, ip_address: &str, command: &str, output: &str) {
        self.inner
            .lock()
            .scripts
            .entry(ip_address.to_string())
            .or_default()
            .push(ScriptedCommand {
                command: command.to_string(),
                output: output.to_string(),
            });
    }

    /// Makes `open()` fail with `AuthError` for this device.
    pub fn fail_auth(&self, ip_address: &str, message: &str) {
        self.inner
            .lock()
            .auth_failures
            .insert(ip_address.to_string(), message.to_string());
    }

    /// Makes `execute()` fail with `TransportError` for this device.
    pub fn fail_execute(&self, ip_address: &str, message: &str) {
        self.inner
            .lock()
            .execute_failures
            .insert(ip_address.to_string(), message.to_string());
    }

    /// Makes `execute()` sleep for `delay` before returning its scripted
    /// output, to make overlapping-execution bugs observable in tests.
    pub fn set_execute_delay(&self, ip_address: &str, delay: Duration) {
        self.inner
            .lock()
            .execute_delays
            .insert(ip_address.to_string(), delay);
    }

    pub fn open_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, SessionCall::Open { .. }))
            .count()
    }

    /// Wall-clock (start, end) instant of each `execute` call observed for
    /// `ip_address`, in call order.
    pub fn execute_windows(&self, ip_address: &str) -> Vec<(Instant, Instant)> {
        self.inner
            .lock()
            .execute_windows
            .get(ip_address)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DeviceSessionAdapter for FakeSessionAdapter {
    async fn open(
        &self,
        info: &DeviceConnectInfo,
        _timeouts: SessionTimeouts,
    ) -> Result<SessionHandle, SessionError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Open {
            ip_address: info.ip_address.clone(),
        });

        if let Some(message) = inner.auth_failures.get(&info.ip_address).cloned() {
            return Err(SessionError::AuthError(message));
        }

        inner.next_id += 1;
        let id = format!("fake-session-{}", inner.next_id);
        inner.open_handles.insert(id.clone(), info.ip_address.clone());
        Ok(SessionHandle(id))
    }

    async fn execute(&self, handle: &SessionHandle, command: &str) -> Result<String, SessionError> {
        let start = Instant::now();
        let (ip, delay) = {
            let mut inner = self.inner.lock();
            inner.calls.push(SessionCall::Execute {
                handle: handle.as_str().to_string(),
                command: command.to_string(),
            });

            let ip = inner
                .open_handles
                .get(handle.as_str())
                .cloned()
                .ok_or(SessionError::NotOpen)?;
            let delay = inner.execute_delays.get(&ip).copied();
            (ip, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        inner
            .execute_windows
            .entry(ip.clone())
            .or_default()
            .push((start, Instant::now()));

        if let Some(message) = inner.execute_failures.get(&ip).cloned() {
            return Err(SessionError::TransportError(message));
        }

        let output = inner
            .scripts
            .get(&ip)
            .and_then(|scripts| scripts.iter().find(|s| s.command == command))
            .map(|s| s.output.clone())
            .unwrap_or_default();
        Ok(output)
    }

    async fn close(&self, handle: &SessionHandle) {
        let mut inner = self.inner.lock();
        inner.calls.push(SessionCall::Close {
            handle: handle.as_str().to_string(),
        });
        inner.open_handles.remove(handle.as_str());
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
