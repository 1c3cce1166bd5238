// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The optional metrics sink contract. Default no-op bodies on every
//! method mirror `SessionAdapter::configure`'s pattern: implementors only
//! override the calls they care about.

use async_trait::async_trait;
use breaker_core::{CallOutcome, ProbeKind};
use std::time::Duration;

/// One guarded call's outcome, handed to [`MetricsSink::record_call`].
#[derive(Debug, Clone, Copy)]
pub struct CallMetric<'a> {
    pub circuit_id: &'a str,
    pub outcome: CallOutcome,
    pub duration: Duration,
}

/// One health-check attempt's outcome, handed to
/// [`MetricsSink::record_health_check`].
#[derive(Debug, Clone, Copy)]
pub struct HealthCheckMetric<'a> {
    pub circuit_id: &'a str,
    pub kind: ProbeKind,
    pub outcome: CallOutcome,
    pub duration: Duration,
}

/// Optional observability sink. The library calls [`initialize`](Self::initialize)
/// once, the first time a breaker with this sink is started; every other
/// method fires from wherever `execute`/the scheduler already is, never on
/// a dedicated task of its own.
#[async_trait]
pub trait MetricsSink: Send + Sync + 'static {
    async fn initialize(&self, _circuit_id: &str) {}

    async fn record_call(&self, _call: CallMetric<'_>) {}

    async fn record_blocked_request(&self, _circuit_id: &str) {}

    async fn record_health_check(&self, _check: HealthCheckMetric<'_>) {}
}
