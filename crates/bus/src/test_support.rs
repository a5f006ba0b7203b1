// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fakes for bus-facing tests: a recording wire and a recording sink.

use crate::bus::{BusSink, Outbound, SinkError};
use lo_core::CoreError;
use parking_lot::Mutex;
use std::sync::Arc;

/// Stand-in for a transport's outbound side, recording every frame.
#[derive(Clone, Default)]
pub struct FakeWire {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    broken: Arc<Mutex<bool>>,
}

impl FakeWire {
    pub fn new() -> Self {
        Self::default()
    }

    /// The closure a [`crate::ByteBus`] uses to write outbound bytes.
    pub fn outbound(&self) -> Outbound {
        let sent = Arc::clone(&self.sent);
        let broken = Arc::clone(&self.broken);
        Box::new(move |payload| {
            if *broken.lock() {
                return Err(CoreError::Transport("wire is down".into()));
            }
            sent.lock().push(payload.to_vec());
            Ok(())
        })
    }

    /// Every frame sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    /// Make subsequent sends fail with a transport error.
    pub fn break_wire(&self) {
        *self.broken.lock() = true;
    }
}

/// Sink collecting every chunk it is handed; optionally failing to test
/// the bus's continue-past-errors contract.
#[derive(Default)]
pub struct RecordingSink {
    chunks: Mutex<Vec<Vec<u8>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { chunks: Mutex::new(Vec::new()), fail: true }
    }

    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.chunks.lock().clone()
    }
}

impl BusSink for RecordingSink {
    fn on_bytes(&self, chunk: &[u8]) -> Result<(), SinkError> {
        self.chunks.lock().push(chunk.to_vec());
        if self.fail {
            return Err(SinkError("recording sink configured to fail".into()));
        }
        Ok(())
    }
}
