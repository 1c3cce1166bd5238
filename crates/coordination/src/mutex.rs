// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The distributed mutex primitive: `try_acquire`/`release`, with
//! automatic renewal while held and a lock-lost notification hook.

use crate::error::CoordinationError;
use async_trait::async_trait;
use std::sync::Arc;

/// Invoked by the store client when a previously-acquired lock is lost
/// (expiry, network partition) without an explicit `release`.
pub type LockLostHook = Arc<dyn Fn() + Send + Sync + 'static>;

/// The distributed mutex contract required from the coordination store.
#[async_trait]
pub trait DistributedMutex: Send + Sync + 'static {
    /// Attempts to acquire `key`. On success, the implementation is
    /// responsible for renewing the lock automatically while held and for
    /// invoking `on_lock_lost` exactly once if it is ever lost without an
    /// explicit `release`.
    async fn try_acquire(
        &self,
        key: &str,
        on_lock_lost: LockLostHook,
    ) -> Result<bool, CoordinationError>;

    /// Releases `key`. A no-op if not currently held by this client.
    async fn release(&self, key: &str) -> Result<(), CoordinationError>;
}

#[cfg(test)]
#[path = "mutex_tests.rs"]
mod tests;
