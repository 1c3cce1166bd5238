// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory bounded window of recent call outcomes, replicated
//! through the call-result log.

use crate::log_reader::{LogReader, LogReaderConfig};
use breaker_coordination::{CoordinationError, CoordinationLog, LogPosition, LogRecord};
use breaker_core::{CallOutcome, CallResultEvent, Clock, Lifecycle, LifecycleError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Configuration a [`CallResultStore`] is started with.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResultStoreConfig {
    pub key: String,
    /// N: the window never holds more than this many events.
    pub window_size: usize,
    /// The MAXLEN hint given to the log on every append (~= window_size).
    pub maxlen_hint: u64,
    pub block: Duration,
    pub retry_backoff: Duration,
}

type OnWindow = Arc<dyn Fn(&[CallResultEvent]) + Send + Sync>;
type OnError = Arc<dyn Fn(&CoordinationError) + Send + Sync>;

pub struct CallResultStore<S, C> {
    lifecycle: Lifecycle<CallResultStoreConfig>,
    store: Arc<S>,
    clock: C,
    reader: LogReader<S>,
    window: Arc<Mutex<VecDeque<CallResultEvent>>>,
    pending_appends: Arc<tokio::sync::Mutex<JoinSet<()>>>,
}

fn parse_call_result(record: &LogRecord) -> Option<CallResultEvent> {
    let outcome = record.field("callResult").and_then(CallOutcome::from_wire)?;
    let timestamp_ms: i64 = record.field("timestamp")?.parse().ok()?;
    Some(CallResultEvent {
        id: record.position.as_str().to_string(),
        outcome,
        timestamp_ms,
    })
}

impl<S: CoordinationLog, C: Clock + 'static> CallResultStore<S, C> {
    pub fn new(store: Arc<S>, clock: C) -> Self {
        CallResultStore {
            lifecycle: Lifecycle::new(),
            reader: LogReader::new(store.clone()),
            store,
            clock,
            window: Arc::new(Mutex::new(VecDeque::new())),
            pending_appends: Arc::new(tokio::sync::Mutex::new(JoinSet::new())),
        }
    }

    pub async fn start(
        &self,
        config: CallResultStoreConfig,
        on_window: OnWindow,
        on_error: OnError,
    ) -> Result<(), LifecycleError> {
        let store = self.store.clone();
        let window = self.window.clone();
        let reader = &self.reader;
        let on_window_for_load = on_window.clone();

        self.lifecycle
            .start(config.clone(), move |cfg| async move {
                let all = store
                    .read_range(&cfg.key, None, usize::MAX)
                    .await
                    .map_err(|e| Box::new(e) as breaker_core::BoxError)?;
                let take_from = all.len().saturating_sub(cfg.window_size);
                let initial: VecDeque<CallResultEvent> = all[take_from..]
                    .iter()
                    .filter_map(parse_call_result)
                    .collect();
                let non_empty = !initial.is_empty();
                *window.lock() = initial;

                if non_empty {
                    let snapshot: Vec<CallResultEvent> = window.lock().iter().cloned().collect();
                    on_window_for_load(&snapshot);
                }

                let window_for_cursor = window.clone();
                let get_last_position: Arc<dyn Fn() -> Option<LogPosition> + Send + Sync> =
                    Arc::new(move || {
                        window_for_cursor
                            .lock()
                            .back()
                            .map(|e| LogPosition::new(e.id.clone()))
                    });

                let window_for_entries = window.clone();
                let window_size = cfg.window_size;
                let on_entries: Arc<dyn Fn(&[LogRecord]) + Send + Sync> = Arc::new(move |batch| {
                    let mut guard = window_for_entries.lock();
                    for record in batch {
                        if let Some(event) = parse_call_result(record) {
                            guard.push_back(event);
                        }
                    }
                    while guard.len() > window_size {
                        guard.pop_front();
                    }
                    let snapshot: Vec<CallResultEvent> = guard.iter().cloned().collect();
                    drop(guard);
                    on_window(&snapshot);
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

    /// Snapshot of the current window, oldest-first.
    pub fn get_events(&self) -> Vec<CallResultEvent> {
        self.window.lock().iter().cloned().collect()
    }

    /// Appends `{outcome, timestamp_ms=now}` to the log with MAXLEN
    /// retention. Fire-and-forget: write errors are reported through
    /// `on_error` rather than returned here.
    pub async fn store_call_result(
        &self,
        key: String,
        maxlen_hint: u64,
        outcome: CallOutcome,
        on_error: OnError,
    ) where
        S: 'static,
    {
        let store = self.store.clone();
        let timestamp_ms = self.clock.epoch_ms();
        let mut pending = self.pending_appends.lock().await;
        pending.spawn(async move {
            let fields = [("callResult", outcome.as_wire()), ("timestamp", &timestamp_ms.to_string())];
            if let Err(err) = store.append(&key, &fields, maxlen_hint).await {
                on_error(&err);
            }
        });
    }

    /// Awaits every fire-and-forget append enqueued so far. See the
    /// design notes' Open Question 1 on call-result flush mode.
    pub async fn flush(&self) {
        let mut guard = self.pending_appends.lock().await;
        while !guard.is_empty() {
            let _ = guard.join_next().await;
        }
    }
}

#[cfg(test)]
#[path = "call_result_store_tests.rs"]
mod tests;
