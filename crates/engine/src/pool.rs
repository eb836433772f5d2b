// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection Pool: caches live Device Sessions per device, serializes
//! access with a per-device mutex, and bounds the number of concurrently
//! live sessions with a semaphore (spec §4.3).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use netcfg_adapters::{DeviceConnectInfo, DeviceSessionAdapter, SessionError, SessionHandle, SessionTimeouts};

struct Entry {
    handle: SessionHandle,
    last_used: Instant,
    /// Held for the lifetime the slot counts against the global cap.
    _permit: OwnedSemaphorePermit,
}

/// Caches one live `DeviceSessionAdapter` session per device id.
///
/// Per-device access is serialized by an async mutex keyed on device id;
/// the global live-session count is bounded by a semaphore sized to
/// `EngineConfig::max_concurrent_backups`-equivalent cap passed at construction.
pub struct ConnectionPool<A: DeviceSessionAdapter> {
    adapter: A,
    sessions: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<Option<Entry>>>>>>,
    cap: Arc<Semaphore>,
}

impl<A: DeviceSessionAdapter> ConnectionPool<A> {
    pub fn new(adapter: A, max_live_sessions: usize) -> Self {
        Self {
            adapter,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            cap: Arc::new(Semaphore::new(max_live_sessions)),
        }
    }

    fn slot(&self, device_id: &str) -> Arc<tokio::sync::Mutex<Option<Entry>>> {
        self.sessions
            .lock()
            .entry(device_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }

    /// Serializes on the device's per-device mutex, opening a session if
    /// none is cached. Returns a guard whose `execute` runs the session
    /// under the lock held for the duration of the call.
    #[allow(clippy::expect_used)]
    pub async fn acquire(
        &self,
        device_id: &str,
        info: &DeviceConnectInfo,
        timeouts: SessionTimeouts,
    ) -> Result<ConnectionGuard<'_, A>, SessionError> {
        let slot = self.slot(device_id);
        let mut guard = slot.lock_owned().await;

        if guard.is_none() {
            let permit = Arc::clone(&self.cap)
                .acquire_owned()
                .await
                .expect("connection pool semaphore is never closed");
            let handle = self.adapter.open(info, timeouts).await?;
            *guard = Some(Entry {
                handle,
                last_used: Instant::now(),
                _permit: permit,
            });
        }

        Ok(ConnectionGuard {
            pool: self,
            slot: Some(guard),
        })
    }

    /// Closes and evicts the cached session for a device, if any.
    pub async fn dispose(&self, device_id: &str) {
        let slot = self.slot(device_id);
        let mut guard = slot.lock().await;
        if let Some(entry) = guard.take() {
            self.adapter.close(&entry.handle).await;
        }
    }

    /// Closes every cached session. Called during daemon shutdown, after
    /// the worker pool has drained (spec §5 shutdown ordering).
    pub async fn shutdown(&self) {
        let ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        for id in ids {
            self.dispose(&id).await;
        }
    }

    /// Closes any cached session idle longer than `max_idle`. Implementation-defined
    /// (spec §4.3); intended to be called from the daemon's periodic tick loop.
    pub async fn sweep_idle(&self, max_idle: std::time::Duration) {
        let ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        for id in ids {
            let slot = self.slot(&id);
            let is_idle = {
                let guard = slot.lock().await;
                guard
                    .as_ref()
                    .map(|entry| entry.last_used.elapsed() >= max_idle)
                    .unwrap_or(false)
            };
            if is_idle {
                self.dispose(&id).await;
            }
        }
    }
}

/// Holds the per-device lock for the duration of one `execute`. On a
/// transport error, `dispose_on_error` must be called before the guard is
/// dropped so the session isn't reused in a broken state (spec §4.3, §4.6 step 9).
pub struct ConnectionGuard<'a, A: DeviceSessionAdapter> {
    pool: &'a ConnectionPool<A>,
    slot: Option<tokio::sync::OwnedMutexGuard<Option<Entry>>>,
}

impl<A: DeviceSessionAdapter> ConnectionGuard<'_, A> {
    #[allow(clippy::expect_used)]
    pub async fn execute(&mut self, command: &str) -> Result<String, SessionError> {
        let guard = self.slot.as_mut().expect("guard not yet released");
        let entry = guard.as_mut().expect("acquire always populates the slot");
        let result = self.pool.adapter.execute(&entry.handle, command).await;
        entry.last_used = Instant::now();
        result
    }

    /// Releases the per-device lock, keeping the session warm for reuse.
    pub fn release(mut self) {
        self.slot.take();
    }

    /// Releases the lock and closes the underlying session (used after a
    /// transport error, per spec §4.3/§4.6).
    pub async fn dispose_on_error(mut self) {
        if let Some(mut guard) = self.slot.take() {
            if let Some(entry) = guard.take() {
                self.pool.adapter.close(&entry.handle).await;
            }
        }
    }
}

impl<A: DeviceSessionAdapter> Drop for ConnectionGuard<'_, A> {
    fn drop(&mut self) {
        // Default exit path: keep the session warm (equivalent to `release`).
        self.slot.take();
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
