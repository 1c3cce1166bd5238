// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pluggable collaborators the orchestrator consults but never
//! implements itself: the failure-detection strategy, the backoff delay
//! function, and the health probe. Each gets a thin `Arc<dyn Fn...>`
//! alias rather than a dedicated trait -- there is exactly one method on
//! each, so a trait buys nothing a function alias doesn't already give a
//! caller, mirroring the boxed-closure-callback style the engine crate
//! uses for its own subsystem hooks (`GetDelayMs`, `RunCheck`).

use crate::error::BreakerError;
use breaker_core::{CallResultEvent, ProbeKind};
use breaker_engine::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A pure function from a window of recent call outcomes to "should
/// transition to Blocking". Concrete policies (consecutive-failures,
/// count-window, time-window) are out of scope for this crate.
pub type FailureStrategy = Arc<dyn Fn(&[CallResultEvent]) -> bool + Send + Sync>;

/// A pure function from attempt number (1-based) to the next delay.
pub type Backoff = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// The caller-supplied probe run by the health-check scheduler. Must not
/// retain a reference back to the orchestrator: it only ever sees its
/// `ProbeKind` and a cancellation token, never a handle to the breaker
/// that invoked it.
pub type HealthProbe =
    Arc<dyn Fn(ProbeKind, CancellationToken) -> BoxFuture<Result<(), BreakerError>> + Send + Sync>;
