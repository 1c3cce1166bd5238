// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction surface for a [`crate::CircuitBreaker`]: the enumerated
//! options from the component spec, collected into one struct and
//! validated at `build()`. The teacher's daemon `Config` (`lifecycle.rs`)
//! is a plain struct populated by an env/CLI layer; there is no CLI layer
//! here, so the builder itself is the construction surface.

use crate::error::BreakerError;
use crate::metrics::MetricsSink;
use crate::strategy::{Backoff, FailureStrategy, HealthProbe};
use breaker_core::{CircuitState, Role};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub type OnError = Arc<dyn Fn(&BreakerError) + Send + Sync>;
pub type OnRoleChange = Arc<dyn Fn(Role) + Send + Sync>;
pub type OnStateChange = Arc<dyn Fn(CircuitState) + Send + Sync>;

/// Raised by [`BreakerConfigBuilder::build`] when a required collaborator
/// is missing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config field: {0}")]
    MissingField(&'static str),
}

/// Collects `id`, the required collaborators (`strategy`, `health.backoff`,
/// `health.check`), the optional `health.idle_probe_interval_ms`, and the
/// optional observability hooks (`on_error`, `on_role_change`,
/// `on_state_change`, `metrics`), plus the store-facing tuning knobs
/// (`window_size`, `state_log_maxlen`, `acquire_interval`,
/// `log_block_timeout`, `log_retry_backoff`).
pub struct BreakerConfig {
    pub id: String,
    pub key_prefix: String,
    pub window_size: usize,
    pub call_result_maxlen: u64,
    pub state_log_maxlen: u64,
    pub acquire_interval: Duration,
    pub log_block_timeout: Duration,
    pub log_retry_backoff: Duration,
    pub strategy: FailureStrategy,
    pub backoff: Backoff,
    pub health_check: HealthProbe,
    pub idle_probe_interval_ms: Option<u64>,
    pub on_error: Option<OnError>,
    pub on_role_change: Option<OnRoleChange>,
    pub on_state_change: Option<OnStateChange>,
    pub metrics: Option<Arc<dyn MetricsSink>>,
}

/// Builder for [`BreakerConfig`]. `id`, `strategy`, `backoff`, and
/// `health_check` are required and checked at [`build`](Self::build);
/// everything else defaults per the component spec (`window_size` 1000,
/// `state_log_maxlen` 10, `acquire_interval` 5s, `log_block_timeout` 1s,
/// `log_retry_backoff` 200ms).
#[derive(Default)]
pub struct BreakerConfigBuilder {
    id: Option<String>,
    key_prefix: Option<String>,
    window_size: Option<usize>,
    call_result_maxlen: Option<u64>,
    state_log_maxlen: Option<u64>,
    acquire_interval: Option<Duration>,
    log_block_timeout: Option<Duration>,
    log_retry_backoff: Option<Duration>,
    strategy: Option<FailureStrategy>,
    backoff: Option<Backoff>,
    health_check: Option<HealthProbe>,
    idle_probe_interval_ms: Option<u64>,
    on_error: Option<OnError>,
    on_role_change: Option<OnRoleChange>,
    on_state_change: Option<OnStateChange>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl BreakerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(key_prefix.into());
        self
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = Some(window_size);
        self
    }

    pub fn call_result_maxlen(mut self, maxlen: u64) -> Self {
        self.call_result_maxlen = Some(maxlen);
        self
    }

    pub fn state_log_maxlen(mut self, maxlen: u64) -> Self {
        self.state_log_maxlen = Some(maxlen);
        self
    }

    pub fn acquire_interval(mut self, interval: Duration) -> Self {
        self.acquire_interval = Some(interval);
        self
    }

    pub fn log_block_timeout(mut self, timeout: Duration) -> Self {
        self.log_block_timeout = Some(timeout);
        self
    }

    pub fn log_retry_backoff(mut self, backoff: Duration) -> Self {
        self.log_retry_backoff = Some(backoff);
        self
    }

    pub fn strategy(mut self, strategy: FailureStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn health_check(mut self, check: HealthProbe) -> Self {
        self.health_check = Some(check);
        self
    }

    pub fn idle_probe_interval_ms(mut self, interval_ms: u64) -> Self {
        self.idle_probe_interval_ms = Some(interval_ms);
        self
    }

    pub fn on_error(mut self, hook: OnError) -> Self {
        self.on_error = Some(hook);
        self
    }

    pub fn on_role_change(mut self, hook: OnRoleChange) -> Self {
        self.on_role_change = Some(hook);
        self
    }

    pub fn on_state_change(mut self, hook: OnStateChange) -> Self {
        self.on_state_change = Some(hook);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<BreakerConfig, ConfigError> {
        let window_size = self.window_size.unwrap_or(1000);
        Ok(BreakerConfig {
            id: self.id.ok_or(ConfigError::MissingField("id"))?,
            key_prefix: self.key_prefix.unwrap_or_else(|| "breaker".to_string()),
            window_size,
            call_result_maxlen: self.call_result_maxlen.unwrap_or(window_size as u64),
            state_log_maxlen: self.state_log_maxlen.unwrap_or(10),
            acquire_interval: self.acquire_interval.unwrap_or(Duration::from_secs(5)),
            log_block_timeout: self.log_block_timeout.unwrap_or(Duration::from_secs(1)),
            log_retry_backoff: self.log_retry_backoff.unwrap_or(Duration::from_millis(200)),
            strategy: self.strategy.ok_or(ConfigError::MissingField("breaker"))?,
            backoff: self
                .backoff
                .ok_or(ConfigError::MissingField("health.backoff"))?,
            health_check: self
                .health_check
                .ok_or(ConfigError::MissingField("health.check"))?,
            idle_probe_interval_ms: self.idle_probe_interval_ms,
            on_error: self.on_error,
            on_role_change: self.on_role_change,
            on_state_change: self.on_state_change,
            metrics: self.metrics,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
