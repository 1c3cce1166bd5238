// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leader election: wraps a [`DistributedMutex`] with an acquire loop at a
//! fixed cadence and a role-change callback fired only on genuine
//! transitions.

use breaker_coordination::{CoordinationError, DistributedMutex, LockLostHook};
use breaker_core::{delay, Lifecycle, LifecycleError, Role};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct ElectorConfig {
    pub key: String,
    /// Fixed cadence at which `try_acquire` is attempted (~5s).
    pub acquire_interval: Duration,
}

type OnRoleChange = Arc<dyn Fn(Role) + Send + Sync>;
type OnError = Arc<dyn Fn(&CoordinationError) + Send + Sync>;

struct RoleState {
    role: Mutex<Role>,
    lost: Notify,
}

pub struct LeaderElector<S> {
    lifecycle: Lifecycle<ElectorConfig>,
    store: Arc<S>,
    role_state: Arc<RoleState>,
    cancel: Arc<Mutex<Option<CancellationToken>>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
    active_key: Arc<Mutex<Option<String>>>,
    active_on_role_change: Arc<Mutex<Option<OnRoleChange>>>,
}

impl<S: DistributedMutex> LeaderElector<S> {
    pub fn new(store: Arc<S>) -> Self {
        LeaderElector {
            lifecycle: Lifecycle::new(),
            store,
            role_state: Arc::new(RoleState {
                role: Mutex::new(Role::Follower),
                lost: Notify::new(),
            }),
            cancel: Arc::new(Mutex::new(None)),
            task: Arc::new(Mutex::new(None)),
            active_key: Arc::new(Mutex::new(None)),
            active_on_role_change: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_leader(&self) -> bool {
        *self.role_state.role.lock() == Role::Leader
    }

    pub async fn start(
        &self,
        config: ElectorConfig,
        on_role_change: OnRoleChange,
        on_error: OnError,
    ) -> Result<(), LifecycleError> {
        let store = self.store.clone();
        let role_state = self.role_state.clone();
        let cancel_slot = self.cancel.clone();
        let task_slot = self.task.clone();
        let active_key = self.active_key.clone();
        let active_on_role_change = self.active_on_role_change.clone();
        let on_role_change_for_task = on_role_change.clone();

        self.lifecycle
            .start(config, move |cfg| async move {
                *active_key.lock() = Some(cfg.key.clone());
                *active_on_role_change.lock() = Some(on_role_change_for_task.clone());

                let cancel = CancellationToken::new();
                let handle = tokio::spawn(acquire_loop(
                    store,
                    cfg,
                    role_state,
                    on_role_change_for_task,
                    on_error,
                    cancel.clone(),
                ));
                *cancel_slot.lock() = Some(cancel);
                *task_slot.lock() = Some(handle);
                Ok(())
            })
            .await
    }

    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let store = self.store.clone();
        let role_state = self.role_state.clone();
        let cancel_slot = self.cancel.clone();
        let task_slot = self.task.clone();
        let active_key = self.active_key.clone();
        let active_on_role_change = self.active_on_role_change.clone();

        self.lifecycle
            .stop(move || async move {
                if let Some(cancel) = cancel_slot.lock().take() {
                    cancel.cancel();
                }
                let handle = task_slot.lock().take();
                if let Some(handle) = handle {
                    let _ = handle.await;
                }

                let key = active_key.lock().take();
                let on_role_change = active_on_role_change.lock().take();
                if let Some(key) = key {
                    let _ = store.release(&key).await;
                }
                let was_leader = {
                    let mut guard = role_state.role.lock();
                    let was_leader = *guard == Role::Leader;
                    *guard = Role::Follower;
                    was_leader
                };
                if was_leader {
                    if let Some(on_role_change) = on_role_change {
                        on_role_change(Role::Follower);
                    }
                }
                Ok(())
            })
            .await
    }
}

async fn acquire_loop<S: DistributedMutex>(
    store: Arc<S>,
    config: ElectorConfig,
    role_state: Arc<RoleState>,
    on_role_change: OnRoleChange,
    on_error: OnError,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let hook_role_state = role_state.clone();
        let hook_on_role_change = on_role_change.clone();
        let on_lock_lost: LockLostHook = Arc::new(move || {
            let became_follower = {
                let mut guard = hook_role_state.role.lock();
                let was_leader = *guard == Role::Leader;
                *guard = Role::Follower;
                was_leader
            };
            if became_follower {
                hook_on_role_change(Role::Follower);
            }
            hook_role_state.lost.notify_one();
        });

        let acquired = tokio::select! {
            result = store.try_acquire(&config.key, on_lock_lost) => result,
            _ = cancel.cancelled() => return,
        };

        match acquired {
            Ok(true) => {
                let became_leader = {
                    let mut guard = role_state.role.lock();
                    if *guard == Role::Follower {
                        *guard = Role::Leader;
                        true
                    } else {
                        false
                    }
                };
                if became_leader {
                    tracing::info!(key = %config.key, "acquired leadership");
                    on_role_change(Role::Leader);
                }

                tokio::select! {
                    _ = role_state.lost.notified() => {}
                    _ = cancel.cancelled() => return,
                }
            }
            Ok(false) => {}
            Err(err) => {
                if !cancel.is_cancelled() {
                    tracing::warn!(key = %config.key, error = %err, "leader acquisition attempt failed");
                    on_error(&err);
                }
            }
        }

        delay(config.acquire_interval, &cancel).await;
    }
}

#[cfg(test)]
#[path = "elector_tests.rs"]
mod tests;
