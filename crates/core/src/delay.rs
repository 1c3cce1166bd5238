// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellable sleep used by every background loop in the breaker.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Waits for `duration`, or returns promptly when `cancel` is triggered.
/// A triggered cancellation is not surfaced as an error; callers inspect
/// `cancel.is_cancelled()` afterwards if they need to distinguish the two.
pub async fn delay(duration: Duration, cancel: &CancellationToken) {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = cancel.cancelled() => {}
    }
}

#[cfg(test)]
#[path = "delay_tests.rs"]
mod tests;
