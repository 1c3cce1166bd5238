// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator: wires the four always-running subsystems together,
//! implements the leader-only policy decisions, and exposes the public
//! `start`/`stop`/`state`/`role`/`execute` surface. Internally an
//! `Arc<Inner>` so the cheap-to-clone handle pattern the teacher's
//! `EventBus` gives its callers carries over here: every clone of a
//! `CircuitBreaker` shares the same four subsystems.

use crate::config::BreakerConfig;
use crate::error::{BreakerError, ExecuteError};
use crate::metrics::{CallMetric, HealthCheckMetric, MetricsSink};
use crate::strategy::{Backoff, FailureStrategy, HealthProbe};
use breaker_coordination::{CoordinationError, CoordinationStore};
use breaker_core::{
    BoxError, CallOutcome, CallResultEvent, CircuitState, Clock, Lifecycle, ProbeKind, Role,
    SystemClock,
};
use breaker_engine::{
    CallResultStore, CallResultStoreConfig, ElectorConfig, GetDelayMs, LeaderElector, RunCheck,
    Scheduler, StateStore, StateStoreConfig,
};
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

struct Inner<S, C> {
    id: String,
    call_result_key: String,
    state_key: String,
    leader_key: String,
    window_size: usize,
    call_result_maxlen: u64,
    state_log_maxlen: u64,
    acquire_interval: Duration,
    log_block_timeout: Duration,
    log_retry_backoff: Duration,
    strategy: FailureStrategy,
    backoff: Backoff,
    health_check: HealthProbe,
    idle_probe_interval_ms: Option<u64>,
    on_error: Option<crate::config::OnError>,
    on_role_change: Option<crate::config::OnRoleChange>,
    on_state_change: Option<crate::config::OnStateChange>,
    metrics: Option<Arc<dyn MetricsSink>>,
    clock: C,
    call_result_store: CallResultStore<S, C>,
    state_store: StateStore<S, C>,
    elector: LeaderElector<S>,
    scheduler: Scheduler,
    lifecycle: Lifecycle<()>,
    run_check: RunCheck,
}

impl<S, C> Inner<S, C>
where
    S: CoordinationStore,
    C: Clock + 'static,
{
    fn new(config: BreakerConfig, store: Arc<S>, clock: C) -> Arc<Self> {
        let call_result_key = format!("{}:{}:call-result", config.key_prefix, config.id);
        let state_key = format!("{}:{}:state", config.key_prefix, config.id);
        let leader_key = format!("{}:{}:leader", config.key_prefix, config.id);

        Arc::new_cyclic(|weak: &Weak<Inner<S, C>>| {
            let weak_for_run_check = weak.clone();
            let run_check: RunCheck = Arc::new(move |kind, cancel| {
                let weak = weak_for_run_check.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        Inner::run_probe(inner, kind, cancel).await;
                    }
                })
            });

            Inner {
                id: config.id,
                call_result_key,
                state_key,
                leader_key,
                window_size: config.window_size,
                call_result_maxlen: config.call_result_maxlen,
                state_log_maxlen: config.state_log_maxlen,
                acquire_interval: config.acquire_interval,
                log_block_timeout: config.log_block_timeout,
                log_retry_backoff: config.log_retry_backoff,
                strategy: config.strategy,
                backoff: config.backoff,
                health_check: config.health_check,
                idle_probe_interval_ms: config.idle_probe_interval_ms,
                on_error: config.on_error,
                on_role_change: config.on_role_change,
                on_state_change: config.on_state_change,
                metrics: config.metrics,
                call_result_store: CallResultStore::new(store.clone(), clock.clone()),
                state_store: StateStore::new(store.clone(), clock.clone()),
                elector: LeaderElector::new(store),
                scheduler: Scheduler::new(),
                lifecycle: Lifecycle::new(),
                run_check,
                clock,
            }
        })
    }

    fn report_error(&self, err: BreakerError) {
        match &self.on_error {
            Some(hook) => hook(&err),
            None => {
                tracing::error!(circuit_id = %self.id, error = %err, "unhandled breaker error")
            }
        }
    }

    fn coordination_error_hook(
        inner: &Arc<Self>,
    ) -> Arc<dyn Fn(&CoordinationError) + Send + Sync> {
        let captured = inner.clone();
        Arc::new(move |err: &CoordinationError| {
            captured.report_error(BreakerError::Coordination(err.clone()))
        })
    }

    /// Runs one probe attempt: invokes the caller's health check, records
    /// the outcome, and (outside the scheduler's own task, see below)
    /// reacts to recovery success or idle failure.
    async fn run_probe(inner: Arc<Self>, kind: ProbeKind, cancel: CancellationToken) {
        let started = Instant::now();
        let result = (inner.health_check)(kind, cancel.clone()).await;
        let duration = started.elapsed();

        if cancel.is_cancelled() {
            // An error surfacing purely because the scheduler was torn
            // down from under this probe is cancellation noise, not a
            // real probe outcome.
            return;
        }

        match result {
            Ok(()) => {
                if let Some(metrics) = &inner.metrics {
                    metrics
                        .record_health_check(HealthCheckMetric {
                            circuit_id: &inner.id,
                            kind,
                            outcome: CallOutcome::Success,
                            duration,
                        })
                        .await;
                }
                match kind {
                    ProbeKind::Recovery => {
                        tracing::info!(circuit_id = %inner.id, "recovery probe succeeded");
                        // Spawned: on_recovery_success restarts the
                        // scheduler, which would deadlock joining its own
                        // task if awaited inline here.
                        tokio::spawn(Inner::on_recovery_success(inner.clone()));
                    }
                    ProbeKind::Idle => {
                        tracing::debug!(circuit_id = %inner.id, "idle probe succeeded");
                    }
                }
            }
            Err(err) => {
                inner.report_error(err);
                if let Some(metrics) = &inner.metrics {
                    metrics
                        .record_health_check(HealthCheckMetric {
                            circuit_id: &inner.id,
                            kind,
                            outcome: CallOutcome::Failure,
                            duration,
                        })
                        .await;
                }
                match kind {
                    ProbeKind::Recovery => {
                        tracing::debug!(circuit_id = %inner.id, "recovery probe failed, retrying after backoff");
                    }
                    ProbeKind::Idle => {
                        tracing::warn!(circuit_id = %inner.id, "idle probe failed, opening circuit");
                        tokio::spawn(Inner::on_idle_failure(inner.clone()));
                    }
                }
            }
        }
    }

    async fn start_recovery_probing(inner: &Arc<Self>) {
        tracing::info!(circuit_id = %inner.id, "starting recovery probing");
        let backoff = inner.backoff.clone();
        let get_delay_ms: GetDelayMs = Arc::new(move |attempt| backoff(attempt).as_millis() as u64);
        inner
            .scheduler
            .restart(ProbeKind::Recovery, get_delay_ms, inner.run_check.clone())
            .await;
    }

    /// Idle probing is only ever started while Passing; the first delay
    /// is computed from the newest observed call-result event so that an
    /// idle window of `idle_probe_interval_ms` since the last call (not
    /// since `start`) elapses before the first probe fires.
    async fn start_idle_probing(inner: &Arc<Self>) {
        let Some(idle_interval_ms) = inner.idle_probe_interval_ms else {
            return;
        };
        tracing::info!(circuit_id = %inner.id, "starting idle probing");
        let captured = inner.clone();
        let get_delay_ms: GetDelayMs = Arc::new(move |attempt| {
            if attempt == 1 {
                let last_event_ms = captured
                    .call_result_store
                    .get_events()
                    .last()
                    .map(|e| e.timestamp_ms)
                    .unwrap_or(0);
                let now = captured.clock.epoch_ms();
                (last_event_ms + idle_interval_ms as i64 - now).max(0) as u64
            } else {
                idle_interval_ms
            }
        });
        inner
            .scheduler
            .restart(ProbeKind::Idle, get_delay_ms, inner.run_check.clone())
            .await;
    }

    async fn on_recovery_success(inner: Arc<Self>) {
        if let Err(err) = inner
            .state_store
            .set_state(&inner.state_key, CircuitState::Passing)
            .await
        {
            inner.report_error(BreakerError::Coordination(err));
        }
        if inner.idle_probe_interval_ms.is_some() {
            Inner::start_idle_probing(&inner).await;
        } else {
            tracing::info!(circuit_id = %inner.id, "recovery complete, stopping probing");
            inner.scheduler.stop().await;
        }
    }

    async fn on_idle_failure(inner: Arc<Self>) {
        if let Err(err) = inner
            .state_store
            .set_state(&inner.state_key, CircuitState::Blocking)
            .await
        {
            inner.report_error(BreakerError::Coordination(err));
        }
        Inner::start_recovery_probing(&inner).await;
    }

    /// Leader-only reaction to a new call-result window (§4.8 "On new
    /// call-result events"). Followers never reach the body of this
    /// function's policy branch; they observe the same window but stay
    /// passive.
    fn on_call_result_window(inner: &Arc<Self>, events: &[CallResultEvent]) {
        if !inner.elector.is_leader() {
            return;
        }
        if inner.state_store.get_state() == CircuitState::Blocking {
            return;
        }

        let cutoff = inner.state_store.get_last_state_change_timestamp();
        let relevant: Vec<CallResultEvent> = events
            .iter()
            .filter(|e| e.timestamp_ms >= cutoff)
            .cloned()
            .collect();
        let should_open = (inner.strategy)(&relevant);

        let captured = inner.clone();
        if should_open {
            tracing::info!(circuit_id = %inner.id, "failure strategy tripped, opening circuit");
            tokio::spawn(async move {
                if let Err(err) = captured
                    .state_store
                    .set_state(&captured.state_key, CircuitState::Blocking)
                    .await
                {
                    captured.report_error(BreakerError::Coordination(err));
                }
                Inner::start_recovery_probing(&captured).await;
            });
        } else if inner.idle_probe_interval_ms.is_some() {
            tokio::spawn(async move {
                Inner::start_idle_probing(&captured).await;
            });
        }
    }

    fn on_role_change(inner: &Arc<Self>, role: Role) {
        tracing::info!(circuit_id = %inner.id, role = %role.as_wire(), "role changed");
        if let Some(hook) = &inner.on_role_change {
            hook(role);
        }
        let captured = inner.clone();
        tokio::spawn(async move {
            match role {
                Role::Leader => {
                    if captured.state_store.get_state() == CircuitState::Blocking {
                        Inner::start_recovery_probing(&captured).await;
                    } else if captured.idle_probe_interval_ms.is_some() {
                        Inner::start_idle_probing(&captured).await;
                    }
                }
                Role::Follower => {
                    captured.scheduler.stop().await;
                }
            }
        });
    }

    fn on_state_changed(inner: &Arc<Self>, state: CircuitState) {
        tracing::info!(circuit_id = %inner.id, state = %state.as_wire(), "state changed");
        if let Some(hook) = &inner.on_state_change {
            hook(state);
        }
    }

    async fn start_internal(inner: Arc<Self>) -> Result<(), BoxError> {
        if let Some(metrics) = &inner.metrics {
            metrics.initialize(&inner.id).await;
        }

        let on_error = Inner::coordination_error_hook(&inner);

        let window_hook = inner.clone();
        let on_window: Arc<dyn Fn(&[CallResultEvent]) + Send + Sync> = Arc::new(move |events| {
            Inner::on_call_result_window(&window_hook, events);
        });

        let state_hook = inner.clone();
        let on_state_change: Arc<dyn Fn(CircuitState) + Send + Sync> = Arc::new(move |state| {
            Inner::on_state_changed(&state_hook, state);
        });

        let role_hook = inner.clone();
        let on_role_change: Arc<dyn Fn(Role) + Send + Sync> = Arc::new(move |role| {
            Inner::on_role_change(&role_hook, role);
        });

        let call_result_cfg = CallResultStoreConfig {
            key: inner.call_result_key.clone(),
            window_size: inner.window_size,
            maxlen_hint: inner.call_result_maxlen,
            block: inner.log_block_timeout,
            retry_backoff: inner.log_retry_backoff,
        };
        let state_cfg = StateStoreConfig {
            key: inner.state_key.clone(),
            maxlen_hint: inner.state_log_maxlen,
            block: inner.log_block_timeout,
            retry_backoff: inner.log_retry_backoff,
        };
        let elector_cfg = ElectorConfig {
            key: inner.leader_key.clone(),
            acquire_interval: inner.acquire_interval,
        };

        tokio::try_join!(
            inner
                .call_result_store
                .start(call_result_cfg, on_window, on_error.clone()),
            inner
                .state_store
                .start(state_cfg, on_state_change, on_error.clone()),
        )
        .map_err(|e| Box::new(e) as BoxError)?;

        inner
            .elector
            .start(elector_cfg, on_role_change, on_error)
            .await
            .map_err(|e| Box::new(e) as BoxError)?;

        Ok(())
    }

    async fn stop_internal(inner: Arc<Self>) -> Result<(), BoxError> {
        let (call_result_result, state_result, elector_result, ()) = tokio::join!(
            inner.call_result_store.stop(),
            inner.state_store.stop(),
            inner.elector.stop(),
            inner.scheduler.stop(),
        );
        call_result_result.map_err(|e| Box::new(e) as BoxError)?;
        state_result.map_err(|e| Box::new(e) as BoxError)?;
        elector_result.map_err(|e| Box::new(e) as BoxError)?;
        Ok(())
    }
}

/// Guards every call to a fragile downstream dependency identified by
/// `config.id`. Cheap to clone: every clone shares the same four
/// subsystems and the same coordination-store handle.
pub struct CircuitBreaker<S, C = SystemClock> {
    inner: Arc<Inner<S, C>>,
}

impl<S, C> Clone for CircuitBreaker<S, C> {
    fn clone(&self) -> Self {
        CircuitBreaker {
            inner: self.inner.clone(),
        }
    }
}

impl<S> CircuitBreaker<S, SystemClock>
where
    S: CoordinationStore,
{
    pub fn new(config: BreakerConfig, store: Arc<S>) -> Self {
        Self::with_clock(config, store, SystemClock)
    }
}

impl<S, C> CircuitBreaker<S, C>
where
    S: CoordinationStore,
    C: Clock + 'static,
{
    /// Constructs a breaker against a caller-supplied clock. Production
    /// code should use [`CircuitBreaker::new`]; tests drive a
    /// [`breaker_core::FakeClock`] through this constructor for
    /// deterministic timestamps.
    pub fn with_clock(config: BreakerConfig, store: Arc<S>, clock: C) -> Self {
        CircuitBreaker {
            inner: Inner::new(config, store, clock),
        }
    }

    /// Starts the call-result store and the state store, then the
    /// elector. Idempotent: a second `start()` while already operational
    /// is a no-op (the orchestrator's own config never varies between
    /// calls, so the lifecycle manager's same-config rule always applies).
    pub async fn start(&self) -> Result<(), BreakerError> {
        let inner = self.inner.clone();
        self.inner
            .lifecycle
            .start((), move |()| async move { Inner::start_internal(inner).await })
            .await
            .map_err(BreakerError::from)
    }

    /// Concurrently stops all four subsystems. Idempotent on an instance
    /// that was never started.
    pub async fn stop(&self) -> Result<(), BreakerError> {
        let inner = self.inner.clone();
        self.inner
            .lifecycle
            .stop(move || async move { Inner::stop_internal(inner).await })
            .await
            .map_err(BreakerError::from)
    }

    /// The state store's cached state. Never blocks on the coordination
    /// store: this is a snapshot read of the locally replicated cache.
    pub fn state(&self) -> CircuitState {
        self.inner.state_store.get_state()
    }

    /// `Leader` if the elector currently holds the mutex, else `Follower`.
    pub fn role(&self) -> Role {
        if self.inner.elector.is_leader() {
            Role::Leader
        } else {
            Role::Follower
        }
    }

    /// Guards one call to `f`. If the circuit is Blocking, `f` is never
    /// invoked and a blocked-request metric is recorded instead. The
    /// call-result append is enqueued asynchronously; this method does
    /// not wait for it before returning.
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, ExecuteError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if self.state() == CircuitState::Blocking {
            if let Some(metrics) = &self.inner.metrics {
                metrics.record_blocked_request(&self.inner.id).await;
            }
            return Err(ExecuteError::CircuitOpen {
                circuit_id: self.inner.id.clone(),
            });
        }

        let started = Instant::now();
        let result = f().await;
        let duration = started.elapsed();
        let outcome = if result.is_ok() {
            CallOutcome::Success
        } else {
            CallOutcome::Failure
        };

        if let Some(metrics) = &self.inner.metrics {
            metrics
                .record_call(CallMetric {
                    circuit_id: &self.inner.id,
                    outcome,
                    duration,
                })
                .await;
        }

        let on_error = Inner::coordination_error_hook(&self.inner);
        self.inner
            .call_result_store
            .store_call_result(
                self.inner.call_result_key.clone(),
                self.inner.call_result_maxlen,
                outcome,
                on_error,
            )
            .await;

        result.map_err(ExecuteError::Guarded)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
