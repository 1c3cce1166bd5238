// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A reusable single-loop health-check scheduler. Deliberately *not*
//! modelled on a passive polling timer map: this is always a single
//! always-on background loop, restarted (never arbitrated) between the
//! two probe policies the orchestrator multiplexes through it.

use breaker_core::delay;
use breaker_core::ProbeKind;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
pub type GetDelayMs = Arc<dyn Fn(u32) -> u64 + Send + Sync>;
pub type RunCheck = Arc<dyn Fn(ProbeKind, CancellationToken) -> BoxFuture<()> + Send + Sync>;

/// Runs `{attempt := 1; loop { sleep(getDelayMs(attempt)); runCheck(kind); attempt += 1 } }`
/// with cooperative cancellation. Exactly one loop runs per `Scheduler` at
/// any moment; `restart` guarantees the previous loop has fully terminated
/// before the next one begins its first sleep.
pub struct Scheduler {
    cancel: Arc<Mutex<Option<CancellationToken>>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            cancel: Arc::new(Mutex::new(None)),
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Starts a fresh loop with `attempt=1`, stopping any loop already
    /// running first.
    pub async fn start(&self, kind: ProbeKind, get_delay_ms: GetDelayMs, run_check: RunCheck) {
        self.stop().await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(kind, get_delay_ms, run_check, cancel.clone()));
        *self.cancel.lock() = Some(cancel);
        *self.task.lock() = Some(handle);
    }

    /// `restart` is just `start`: `start` already guarantees the previous
    /// loop is fully stopped before a new one begins.
    pub async fn restart(&self, kind: ProbeKind, get_delay_ms: GetDelayMs, run_check: RunCheck) {
        self.start(kind, get_delay_ms, run_check).await;
    }

    pub async fn stop(&self) {
        if let Some(cancel) = self.cancel.lock().take() {
            cancel.cancel();
        }
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn run_loop(
    kind: ProbeKind,
    get_delay_ms: GetDelayMs,
    run_check: RunCheck,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 1;
    loop {
        let delay_ms = get_delay_ms(attempt);
        delay(Duration::from_millis(delay_ms), &cancel).await;
        if cancel.is_cancelled() {
            return;
        }
        run_check(kind, cancel.clone()).await;
        attempt += 1;
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
