// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Transient failures reading/writing the log or acquiring the mutex.
/// Always recovered locally by the affected loop (back-off and retry);
/// never fails `execute`. Reported through `onError` for observability.
#[derive(Debug, Error, Clone)]
pub enum CoordinationError {
    #[error("append to {key} failed: {message}")]
    AppendFailed { key: String, message: String },

    #[error("read from {key} failed: {message}")]
    ReadFailed { key: String, message: String },

    #[error("tail of {key} failed: {message}")]
    TailFailed { key: String, message: String },

    #[error("mutex operation on {key} failed: {message}")]
    MutexFailed { key: String, message: String },

    #[error("connection to the coordination store unavailable: {0}")]
    Unavailable(String),
}
