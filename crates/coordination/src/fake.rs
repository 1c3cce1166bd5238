// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory `CoordinationStore` used by every test in the workspace,
//! gated the same way the teacher gates `FakeSessionAdapter`: available
//! whenever `cfg(test)` or the `test-support` feature is active, never in
//! a production build.

use crate::error::CoordinationError;
use crate::log::{CoordinationLog, LogPosition, LogRecord};
use crate::mutex::{DistributedMutex, LockLostHook};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct Held {
    #[allow(dead_code)]
    on_lock_lost: LockLostHook,
}

#[derive(Default)]
struct State {
    logs: HashMap<String, Vec<LogRecord>>,
    seq: HashMap<String, u64>,
    locks: HashMap<String, Held>,
}

/// An in-memory coordination store: one shared handle may be cloned and
/// given to multiple `CircuitBreaker` instances in a test, exactly as
/// multiple real processes would share one backing store.
#[derive(Clone, Default)]
pub struct FakeCoordinationStore {
    state: Arc<Mutex<State>>,
}

impl FakeCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-only: simulates the backing store losing a held lock out from
    /// under its holder (expiry, network partition), invoking the
    /// registered `on_lock_lost` hook synchronously.
    pub fn force_lose_lock(&self, key: &str) {
        let held = self.state.lock().locks.remove(key);
        if let Some(held) = held {
            (held.on_lock_lost)();
        }
    }

    fn next_position(state: &mut State, key: &str) -> LogPosition {
        let counter = state.seq.entry(key.to_string()).or_insert(0);
        *counter += 1;
        LogPosition::new(format!("{counter:020}"))
    }
}

#[async_trait]
impl CoordinationLog for FakeCoordinationStore {
    async fn append(
        &self,
        key: &str,
        fields: &[(&str, &str)],
        maxlen_hint: u64,
    ) -> Result<LogPosition, CoordinationError> {
        let mut state = self.state.lock();
        let position = Self::next_position(&mut state, key);
        let record = LogRecord {
            position: position.clone(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        let entries = state.logs.entry(key.to_string()).or_default();
        entries.push(record);
        let maxlen = maxlen_hint.max(1) as usize;
        if entries.len() > maxlen {
            let excess = entries.len() - maxlen;
            entries.drain(0..excess);
        }
        Ok(position)
    }

    async fn read_range(
        &self,
        key: &str,
        from: Option<&LogPosition>,
        count: usize,
    ) -> Result<Vec<LogRecord>, CoordinationError> {
        let state = self.state.lock();
        let entries = state.logs.get(key).cloned().unwrap_or_default();
        let filtered: Vec<LogRecord> = entries
            .into_iter()
            .filter(|r| from.map_or(true, |f| &r.position > f))
            .take(count)
            .collect();
        Ok(filtered)
    }

    async fn tail(
        &self,
        key: &str,
        after: Option<&LogPosition>,
        block: Duration,
    ) -> Result<Vec<LogRecord>, CoordinationError> {
        let immediate = self.read_range(key, after, usize::MAX).await?;
        if !immediate.is_empty() || block.is_zero() {
            return Ok(immediate);
        }
        tokio::time::sleep(block).await;
        self.read_range(key, after, usize::MAX).await
    }
}

#[async_trait]
impl DistributedMutex for FakeCoordinationStore {
    async fn try_acquire(
        &self,
        key: &str,
        on_lock_lost: LockLostHook,
    ) -> Result<bool, CoordinationError> {
        let mut state = self.state.lock();
        if state.locks.contains_key(key) {
            return Ok(false);
        }
        state.locks.insert(key.to_string(), Held { on_lock_lost });
        Ok(true)
    }

    async fn release(&self, key: &str) -> Result<(), CoordinationError> {
        self.state.lock().locks.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
