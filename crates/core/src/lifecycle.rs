// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five-phase lifecycle state machine every subsystem embeds, replacing
//! ad-hoc "started" booleans with one centralised, uniformly-tested state
//! machine (Inactive -> Starting -> Operational -> Stopping -> Inactive,
//! with Unrecoverable reachable from any phase).

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;

/// A boxed error produced by a subsystem's start/stop hook.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors a [`Lifecycle`] surfaces synchronously to the caller of `start`/`stop`.
#[derive(Debug, Error, Clone)]
pub enum LifecycleError {
    #[error("start already in flight with a different configuration")]
    Busy,
    #[error("already operational with a different configuration")]
    AlreadyRunning,
    #[error("instance is unrecoverable: {0}")]
    Unrecoverable(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),
}

/// The five phases a subsystem's lifecycle can be in. `Starting` and
/// `Operational` carry the config they were (or are being) started with;
/// `Unrecoverable` carries the cause.
pub enum LifecyclePhase<C> {
    Inactive,
    Starting(C),
    Operational(C),
    Stopping,
    Unrecoverable(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl<C: Clone> Clone for LifecyclePhase<C> {
    fn clone(&self) -> Self {
        match self {
            LifecyclePhase::Inactive => LifecyclePhase::Inactive,
            LifecyclePhase::Starting(c) => LifecyclePhase::Starting(c.clone()),
            LifecyclePhase::Operational(c) => LifecyclePhase::Operational(c.clone()),
            LifecyclePhase::Stopping => LifecyclePhase::Stopping,
            LifecyclePhase::Unrecoverable(cause) => LifecyclePhase::Unrecoverable(cause.clone()),
        }
    }
}

struct Inner<C> {
    phase: Mutex<LifecyclePhase<C>>,
    notify: Notify,
}

/// A generic lifecycle state machine, shared by cheap clone across every
/// task that needs to observe or drive it.
pub struct Lifecycle<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for Lifecycle<C> {
    fn clone(&self) -> Self {
        Lifecycle {
            inner: self.inner.clone(),
        }
    }
}

impl<C> Default for Lifecycle<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone + PartialEq + Send + Sync + 'static> Lifecycle<C> {
    pub fn new() -> Self {
        Lifecycle {
            inner: Arc::new(Inner {
                phase: Mutex::new(LifecyclePhase::Inactive),
                notify: Notify::new(),
            }),
        }
    }

    /// Promotes Inactive -> Starting -> Operational, running `start_internal`
    /// in between. See module docs and the component spec for the full
    /// join/busy/no-op matrix.
    pub async fn start<F, Fut>(&self, config: C, start_internal: F) -> Result<(), LifecycleError>
    where
        F: FnOnce(C) -> Fut,
        Fut: Future<Output = Result<(), BoxError>>,
    {
        // The Inactive arm below is the only one that falls through rather
        // than looping or returning, so `start_internal` is moved out and
        // run exactly once, after the loop, with no `Option`/`expect` needed.
        loop {
            let snapshot = self.inner.phase.lock().clone();
            match snapshot {
                LifecyclePhase::Inactive => {
                    *self.inner.phase.lock() = LifecyclePhase::Starting(config.clone());
                    break;
                }
                LifecyclePhase::Starting(existing) if existing == config => {
                    self.inner.notify.notified().await;
                }
                LifecyclePhase::Starting(_) => return Err(LifecycleError::Busy),
                LifecyclePhase::Operational(existing) if existing == config => return Ok(()),
                LifecyclePhase::Operational(_) => return Err(LifecycleError::AlreadyRunning),
                LifecyclePhase::Stopping => {
                    self.inner.notify.notified().await;
                }
                LifecyclePhase::Unrecoverable(cause) => {
                    return Err(LifecycleError::Unrecoverable(cause))
                }
            }
        }

        let result = start_internal(config.clone()).await;
        let outcome = match result {
            Ok(()) => {
                *self.inner.phase.lock() = LifecyclePhase::Operational(config.clone());
                Ok(())
            }
            Err(e) => {
                let cause: Arc<dyn std::error::Error + Send + Sync + 'static> = Arc::from(e);
                *self.inner.phase.lock() = LifecyclePhase::Unrecoverable(cause.clone());
                Err(LifecycleError::Unrecoverable(cause))
            }
        };
        self.inner.notify.notify_waiters();
        outcome
    }

    /// Promotes Operational -> Stopping -> Inactive, running `stop_internal`
    /// in between. Idempotent on Inactive.
    pub async fn stop<F, Fut>(&self, stop_internal: F) -> Result<(), LifecycleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), BoxError>>,
    {
        // The Operational arm below is the only one that falls through
        // rather than looping or returning, so `stop_internal` is moved
        // out and run exactly once, after the loop, with no
        // `Option`/`expect` needed.
        loop {
            let snapshot = self.inner.phase.lock().clone();
            match snapshot {
                LifecyclePhase::Inactive => return Ok(()),
                LifecyclePhase::Operational(_) => {
                    *self.inner.phase.lock() = LifecyclePhase::Stopping;
                    break;
                }
                LifecyclePhase::Starting(_) | LifecyclePhase::Stopping => {
                    self.inner.notify.notified().await;
                }
                LifecyclePhase::Unrecoverable(cause) => {
                    return Err(LifecycleError::Unrecoverable(cause))
                }
            }
        }

        let result = stop_internal().await;
        let outcome = match result {
            Ok(()) => {
                *self.inner.phase.lock() = LifecyclePhase::Inactive;
                Ok(())
            }
            Err(e) => {
                let cause: Arc<dyn std::error::Error + Send + Sync + 'static> = Arc::from(e);
                *self.inner.phase.lock() = LifecyclePhase::Unrecoverable(cause.clone());
                Err(LifecycleError::Unrecoverable(cause))
            }
        };
        self.inner.notify.notify_waiters();
        outcome
    }

    /// Repeatedly stops until Inactive, then starts with `config`.
    pub async fn restart<FStart, FutStart, FStop, FutStop>(
        &self,
        config: C,
        start_internal: FStart,
        stop_internal: FStop,
    ) -> Result<(), LifecycleError>
    where
        FStart: FnOnce(C) -> FutStart,
        FutStart: Future<Output = Result<(), BoxError>>,
        FStop: FnOnce() -> FutStop,
        FutStop: Future<Output = Result<(), BoxError>>,
    {
        self.stop(stop_internal).await?;
        self.start(config, start_internal).await
    }

    /// Read-only predicate; true only while phase is Operational.
    pub fn is_operational(&self) -> bool {
        matches!(&*self.inner.phase.lock(), LifecyclePhase::Operational(_))
    }

    /// True once the instance has become Unrecoverable; it must be
    /// recreated, no further transition is possible.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(&*self.inner.phase.lock(), LifecyclePhase::Unrecoverable(_))
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
