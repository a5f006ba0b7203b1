// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds surfaced by the observation runtime.
//!
//! One enum covers every failure a caller can see: timeouts (observer
//! deadline or caller wait bound), cancellation, API misuse, transport
//! failures, admission refusals and command failures. The enum is `Clone`
//! because a failure stored on an observer is re-raised to every caller
//! that asks for its result.

use std::time::Duration;
use thiserror::Error;

/// Which clock fired a [`CoreError::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// The observer's own deadline elapsed while it was running.
    Deadline,
    /// The caller's wait bound elapsed before the observer finished.
    AwaitBound,
}

impl std::fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimeoutKind::Deadline => "deadline",
            TimeoutKind::AwaitBound => "await bound",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("{kind} timeout after {elapsed:?} (limit {limit:?})")]
    Timeout {
        kind: TimeoutKind,
        limit: Duration,
        elapsed: Duration,
    },

    #[error("observer was cancelled")]
    Cancelled,

    #[error("wrong usage: {0}")]
    WrongUsage(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("refusing admission: {open}/{limit} file descriptors open, within guard band of soft limit")]
    ResourceLimit { open: u64, limit: u64 },

    #[error("command `{command}` failed: {output}")]
    CommandFailure { command: String, output: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Timeout raised by a runner's progress task when the observer's own
    /// deadline elapsed.
    pub fn deadline_timeout(limit: Duration, elapsed: Duration) -> Self {
        CoreError::Timeout { kind: TimeoutKind::Deadline, limit, elapsed }
    }

    /// Timeout raised on behalf of a caller whose `wait` bound elapsed.
    pub fn await_timeout(limit: Duration, elapsed: Duration) -> Self {
        CoreError::Timeout { kind: TimeoutKind::AwaitBound, limit, elapsed }
    }

    pub fn wrong_usage(msg: impl Into<String>) -> Self {
        CoreError::WrongUsage(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
