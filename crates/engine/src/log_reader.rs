// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking tail of a replicated append-only log, with resume-by-cursor
//! and error back-off. Mirrors the wake-signal-driven tail loop the
//! teacher's event bus uses over a local WAL, generalised to poll an
//! abstract [`CoordinationLog`] instead.

use breaker_coordination::{CoordinationError, CoordinationLog, LogPosition, LogRecord};
use breaker_core::{delay, Lifecycle, LifecycleError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Configuration a [`LogReader`] is started with. Compared by structural
/// equality per the lifecycle manager's idempotence rules.
#[derive(Debug, Clone, PartialEq)]
pub struct LogReaderConfig {
    pub key: String,
    /// Bounded block timeout on each tail call (~1s per the component spec).
    pub block: Duration,
    /// Sleep interval between retries after a transport error.
    pub retry_backoff: Duration,
}

type OnEntries = Arc<dyn Fn(&[LogRecord]) + Send + Sync>;
type OnError = Arc<dyn Fn(&CoordinationError) + Send + Sync>;
type GetLastPosition = Arc<dyn Fn() -> Option<LogPosition> + Send + Sync>;

/// Tails one log key, invoking `on_entries` for each non-empty batch and
/// `on_error` for transport failures outside of shutdown.
pub struct LogReader<S> {
    lifecycle: Lifecycle<LogReaderConfig>,
    store: Arc<S>,
    cancel: Arc<Mutex<Option<CancellationToken>>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<S: CoordinationLog> LogReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        LogReader {
            lifecycle: Lifecycle::new(),
            store,
            cancel: Arc::new(Mutex::new(None)),
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn start(
        &self,
        config: LogReaderConfig,
        get_last_position: GetLastPosition,
        on_entries: OnEntries,
        on_error: OnError,
    ) -> Result<(), LifecycleError> {
        let store = self.store.clone();
        let cancel_slot = self.cancel.clone();
        let task_slot = self.task.clone();
        self.lifecycle
            .start(config, move |cfg| async move {
                let cancel = CancellationToken::new();
                let handle = tokio::spawn(run_loop(
                    store,
                    cfg,
                    cancel.clone(),
                    get_last_position,
                    on_entries,
                    on_error,
                ));
                *cancel_slot.lock() = Some(cancel);
                *task_slot.lock() = Some(handle);
                Ok(())
            })
            .await
    }

    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let cancel_slot = self.cancel.clone();
        let task_slot = self.task.clone();
        self.lifecycle
            .stop(move || async move {
                if let Some(cancel) = cancel_slot.lock().take() {
                    cancel.cancel();
                }
                let handle = task_slot.lock().take();
                if let Some(handle) = handle {
                    let _ = handle.await;
                }
                Ok(())
            })
            .await
    }
}

async fn run_loop<S: CoordinationLog>(
    store: Arc<S>,
    config: LogReaderConfig,
    cancel: CancellationToken,
    get_last_position: GetLastPosition,
    on_entries: OnEntries,
    on_error: OnError,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let cursor = get_last_position();
        let outcome = tokio::select! {
            result = store.tail(&config.key, cursor.as_ref(), config.block) => Some(result),
            _ = cancel.cancelled() => None,
        };

        let Some(result) = outcome else {
            return;
        };

        match result {
            Ok(entries) => {
                if !entries.is_empty() {
                    on_entries(&entries);
                }
            }
            Err(err) => {
                if cancel.is_cancelled() {
                    // Errors surfacing purely as a consequence of forced
                    // disconnection are suppressed, not reported.
                    continue;
                }
                tracing::warn!(key = %config.key, error = %err, "log tail failed, retrying after backoff");
                on_error(&err);
                delay(config.retry_backoff, &cancel).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "log_reader_tests.rs"]
mod tests;
