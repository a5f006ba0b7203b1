// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reusable text feeders.
//!
//! [`LineWatch`] recognizes a needle in line-oriented traffic and
//! completes with the matching line and a wall-clock stamp. [`Reply`]
//! accumulates a command's reply until a success terminator or an error
//! marker appears. Both are generic text primitives; anything
//! endpoint-specific (which needle, which terminator) is the caller's.

use crate::feed::{Feed, Feeder};
use lo_core::{Clock, CoreError, SystemClock};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Watches line-oriented traffic for a needle.
///
/// Chunks are buffered until a full line arrives; the first line
/// containing the needle completes the observation with
/// `{"line": ..., "time_ms": ...}`.
pub struct LineWatch<C: Clock = SystemClock> {
    needle: String,
    buffer: String,
    clock: C,
}

impl LineWatch<SystemClock> {
    pub fn new(needle: impl Into<String>) -> Self {
        Self::with_clock(needle, SystemClock)
    }
}

impl<C: Clock> LineWatch<C> {
    pub fn with_clock(needle: impl Into<String>, clock: C) -> Self {
        Self { needle: needle.into(), buffer: String::new(), clock }
    }
}

impl<C: Clock> Feeder for LineWatch<C> {
    fn feed(&mut self, chunk: &[u8]) -> Feed {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        while let Some(end) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=end).collect();
            let line = line.trim_end_matches('\n');
            if line.contains(&self.needle) {
                return Feed::Done(json!({
                    "line": line,
                    "time_ms": self.clock.epoch_ms(),
                }));
            }
        }
        Feed::Pending
    }
}

/// View of a command's accumulated reply, shared between the feeder and
/// the caller that wants "output observed so far".
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<String>>);

impl SharedOutput {
    pub fn snapshot(&self) -> String {
        self.0.lock().clone()
    }

    fn append(&self, chunk: &[u8]) {
        self.0.lock().push_str(&String::from_utf8_lossy(chunk));
    }
}

/// Accumulates a command's reply until it terminates.
///
/// The error marker is checked before the success terminator, so a reply
/// carrying both fails.
pub struct Reply {
    command: String,
    ok: String,
    err: Option<String>,
    requires_result: bool,
    output: SharedOutput,
}

impl Reply {
    pub fn new(
        command: impl Into<String>,
        ok: impl Into<String>,
        err: Option<String>,
        requires_result: bool,
    ) -> Self {
        Self {
            command: command.into(),
            ok: ok.into(),
            err,
            requires_result,
            output: SharedOutput::default(),
        }
    }

    pub fn output(&self) -> SharedOutput {
        self.output.clone()
    }
}

impl Feeder for Reply {
    fn feed(&mut self, chunk: &[u8]) -> Feed {
        self.output.append(chunk);
        let seen = self.output.snapshot();
        if let Some(err) = &self.err {
            if seen.contains(err.as_str()) {
                return Feed::Failed(CoreError::CommandFailure {
                    command: self.command.clone(),
                    output: seen,
                });
            }
        }
        if seen.contains(self.ok.as_str()) {
            return if self.requires_result {
                Feed::Done(json!({ "output": seen }))
            } else {
                Feed::Done(json!({}))
            };
        }
        Feed::Pending
    }
}

#[cfg(test)]
#[path = "feeders_tests.rs"]
mod tests;
