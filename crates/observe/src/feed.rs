// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single polymorphic operation of an observer.
//!
//! Domain logic is a [`Feeder`]: a chunk-by-chunk state machine whose
//! only effect is its return value. One call either keeps the observer
//! running, completes it with a value, or fails it.

use lo_core::CoreError;
use serde_json::Value;

/// Outcome of feeding one chunk to an observer.
#[derive(Debug)]
pub enum Feed {
    /// Nothing recognized yet; keep watching.
    Pending,
    /// Observation complete; the observer succeeds with this value.
    Done(Value),
    /// Observation failed; the error is stored on the observer.
    Failed(CoreError),
}

/// Chunk-by-chunk recognizer driven under the observer lock.
///
/// Implementations must be pure with respect to the observer: they may
/// mutate their own accumulation state only, and must never block.
pub trait Feeder: Send {
    fn feed(&mut self, chunk: &[u8]) -> Feed;
}

impl<F> Feeder for F
where
    F: FnMut(&[u8]) -> Feed + Send,
{
    fn feed(&mut self, chunk: &[u8]) -> Feed {
        self(chunk)
    }
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
