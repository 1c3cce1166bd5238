// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top-level error taxonomy, composing the lower crates' errors via
//! `#[from]` the same way the teacher composes `oj_storage::WalError` into
//! `oj_daemon::LifecycleError`.

use breaker_coordination::CoordinationError;
use breaker_core::LifecycleError;
use thiserror::Error;

/// Any error a subsystem can report through `on_error`, or that a
/// caller-supplied health probe can return. `CircuitOpen` is reachable
/// only through [`ExecuteError`], never constructed here, but is kept on
/// this enum too so a probe or a hook can still surface it if it somehow
/// observes one (e.g. a probe implemented in terms of `execute` against a
/// *different* breaker).
#[derive(Debug, Error, Clone)]
pub enum BreakerError {
    #[error("circuit {circuit_id} is open")]
    CircuitOpen { circuit_id: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Coordination(#[from] CoordinationError),

    #[error("health probe failed: {message}")]
    Probe { message: String },
}

/// `execute`'s error type. Keeps the guarded function's own error
/// structurally distinct from `CircuitOpen` rather than erasing both to
/// `Box<dyn Error>`, so callers can `match` on `CircuitOpen` without
/// downcasting.
#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    #[error("circuit {circuit_id} is open")]
    CircuitOpen { circuit_id: String },

    #[error("guarded call failed")]
    Guarded(#[source] E),
}

impl<E> ExecuteError<E> {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ExecuteError::CircuitOpen { .. })
    }
}
