// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process transport for integration tests: outbound frames are
//! recorded, inbound traffic is injected by hand.

use crate::{Transport, TransportError};
use async_trait::async_trait;
use lo_bus::ByteBus;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
pub struct MemoryTransport {
    bus: Mutex<Option<Arc<ByteBus>>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Frames pushed outbound so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    /// Deliver inbound bytes as if the peer had written them.
    pub fn inject(&self, chunk: &[u8]) -> Result<(), TransportError> {
        let bus = self.bus.lock().clone().ok_or(TransportError::Closed)?;
        bus.on_bytes(chunk);
        Ok(())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, bus: Arc<ByteBus>) -> Result<(), TransportError> {
        let mut slot = self.bus.lock();
        if slot.is_some() {
            return Err(TransportError::AlreadyOpen);
        }
        *slot = Some(bus);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.bus.lock().take();
        Ok(())
    }

    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        if self.bus.lock().is_none() {
            return Err(TransportError::Closed);
        }
        self.sent.lock().push(payload.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
