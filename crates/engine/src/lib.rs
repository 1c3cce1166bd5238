// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The four always-running subsystems the orchestrator wires together: a
//! replicated call-result window, a replicated circuit-state cell, a
//! leader elector, and a health-check scheduler. Each embeds
//! [`breaker_core::Lifecycle`] except the scheduler, which always wants a
//! fresh attempt counter on every `start`/`restart` rather than the
//! lifecycle manager's same-config-is-a-no-op idempotence.

pub mod call_result_store;
pub mod elector;
pub mod log_reader;
pub mod scheduler;
pub mod state_store;

pub use call_result_store::{CallResultStore, CallResultStoreConfig};
pub use elector::{ElectorConfig, LeaderElector};
pub use log_reader::{LogReader, LogReaderConfig};
pub use scheduler::{BoxFuture, GetDelayMs, RunCheck, Scheduler};
pub use state_store::{StateStore, StateStoreConfig};
