// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The replicated current circuit state plus its transition timestamp.

use crate::log_reader::{LogReader, LogReaderConfig};
use breaker_coordination::{CoordinationError, CoordinationLog, LogPosition, LogRecord};
use breaker_core::{CircuitState, Clock, Lifecycle, LifecycleError, StateEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct StateStoreConfig {
    pub key: String,
    /// Small MAXLEN retention, ~10 entries per the component spec.
    pub maxlen_hint: u64,
    pub block: Duration,
    pub retry_backoff: Duration,
}

type OnStateChange = Arc<dyn Fn(CircuitState) + Send + Sync>;
type OnError = Arc<dyn Fn(&CoordinationError) + Send + Sync>;

fn parse_state_event(record: &LogRecord) -> Option<StateEvent> {
    let state = record.field("state").and_then(CircuitState::from_wire)?;
    let timestamp_ms: i64 = record.field("timestamp")?.parse().ok()?;
    Some(StateEvent {
        id: record.position.as_str().to_string(),
        state,
        timestamp_ms,
    })
}

pub struct StateStore<S, C> {
    lifecycle: Lifecycle<StateStoreConfig>,
    store: Arc<S>,
    clock: C,
    reader: LogReader<S>,
    cached: Arc<Mutex<StateEvent>>,
    maxlen_hint: Arc<Mutex<u64>>,
}

impl<S: CoordinationLog, C: Clock + 'static> StateStore<S, C> {
    pub fn new(store: Arc<S>, clock: C) -> Self {
        StateStore {
            lifecycle: Lifecycle::new(),
            reader: LogReader::new(store.clone()),
            store,
            clock,
            cached: Arc::new(Mutex::new(StateEvent::initial())),
            maxlen_hint: Arc::new(Mutex::new(10)),
        }
    }

    pub async fn start(
        &self,
        config: StateStoreConfig,
        on_state_change: OnStateChange,
        on_error: OnError,
    ) -> Result<(), LifecycleError> {
        let store = self.store.clone();
        let cached = self.cached.clone();
        let maxlen_hint = self.maxlen_hint.clone();
        let reader = &self.reader;

        self.lifecycle
            .start(config.clone(), move |cfg| async move {
                *maxlen_hint.lock() = cfg.maxlen_hint;
                let latest = store
                    .read_range(&cfg.key, None, usize::MAX)
                    .await
                    .map_err(|e| Box::new(e) as breaker_core::BoxError)?;
                if let Some(event) = latest.last().and_then(parse_state_event) {
                    *cached.lock() = event;
                }
                // Initial load never fires the state-change callback.

                let cached_for_cursor = cached.clone();
                let get_last_position: Arc<dyn Fn() -> Option<LogPosition> + Send + Sync> =
                    Arc::new(move || {
                        let id = cached_for_cursor.lock().id.clone();
                        if id == "0" {
                            None
                        } else {
                            Some(LogPosition::new(id))
                        }
                    });

                let cached_for_entries = cached.clone();
                let on_entries: Arc<dyn Fn(&[LogRecord]) + Send + Sync> = Arc::new(move |batch| {
                    let Some(last_record) = batch.last() else {
                        return;
                    };
                    let Some(event) = parse_state_event(last_record) else {
                        return;
                    };
                    let previous = cached_for_entries.lock().state;
                    *cached_for_entries.lock() = event.clone();
                    if event.state != previous {
                        on_state_change(event.state);
                    }
                });

                reader
                    .start(
                        LogReaderConfig {
                            key: cfg.key.clone(),
                            block: cfg.block,
                            retry_backoff: cfg.retry_backoff,
                        },
                        get_last_position,
                        on_entries,
                        on_error,
                    )
                    .await
                    .map_err(|e| Box::new(e) as breaker_core::BoxError)?;

                Ok(())
            })
            .await
    }

    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let reader = &self.reader;
        self.lifecycle
            .stop(move || async move {
                reader
                    .stop()
                    .await
                    .map_err(|e| Box::new(e) as breaker_core::BoxError)?;
                Ok(())
            })
            .await
    }

    pub fn get_state(&self) -> CircuitState {
        self.cached.lock().state
    }

    pub fn get_last_state_change_timestamp(&self) -> i64 {
        self.cached.lock().timestamp_ms
    }

    /// Appends `{state, timestamp_ms=now}` with the configured MAXLEN
    /// retention (`StateStoreConfig.maxlen_hint`, ~10 entries by default).
    /// Only ever called by the leader.
    pub async fn set_state(&self, key: &str, state: CircuitState) -> Result<(), CoordinationError> {
        let timestamp_ms = self.clock.epoch_ms();
        let maxlen_hint = *self.maxlen_hint.lock();
        let fields = [("state", state.as_wire()), ("timestamp", &timestamp_ms.to_string())];
        self.store.append(key, &fields, maxlen_hint).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
