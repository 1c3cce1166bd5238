// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! A distributed circuit breaker: a replicated call-result window, a
//! replicated open/closed state, leader-only health probing, and a
//! guarded-call entry point, all built on a pluggable append-log +
//! distributed-mutex coordination store.
//!
//! See [`CircuitBreaker`] for the main entry point and
//! [`BreakerConfigBuilder`] for construction.

pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod strategy;

pub use breaker_core::{
    CallOutcome, CallResultEvent, CircuitState, Clock, ProbeKind, Role, StateEvent, SystemClock,
};
pub use breaker_coordination::{
    CoordinationError, CoordinationLog, CoordinationStore, DistributedMutex, LogPosition,
    LogRecord,
};
pub use config::{BreakerConfig, BreakerConfigBuilder, ConfigError};
pub use error::{BreakerError, ExecuteError};
pub use metrics::{CallMetric, HealthCheckMetric, MetricsSink};
pub use orchestrator::CircuitBreaker;
pub use strategy::{Backoff, FailureStrategy, HealthProbe};
