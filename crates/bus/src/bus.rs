// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The publish/subscribe fanout point.

use crate::codec::ByteAdapter;
use lo_core::CoreError;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a sink while consuming a chunk.
///
/// Sink failures are logged by the bus and never propagated to the
/// transport or to other sinks.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Receiver of inbound bytes. Registered as `Arc<dyn BusSink>`; the `Arc`
/// allocation address is the sink's identity for subscribe/unsubscribe.
pub trait BusSink: Send + Sync {
    fn on_bytes(&self, chunk: &[u8]) -> Result<(), SinkError>;
}

/// Writes bytes to the underlying transport.
pub type Outbound = Box<dyn Fn(&[u8]) -> Result<(), CoreError> + Send + Sync>;

/// Named pub/sub point wrapping one duplex byte transport.
///
/// Subscriptions are independent of the transport being open; the bus
/// lives as long as the owning transport.
pub struct ByteBus {
    name: String,
    subscribers: Mutex<Vec<Arc<dyn BusSink>>>,
    outbound: Outbound,
    encode: Option<ByteAdapter>,
    decode: Option<ByteAdapter>,
}

impl ByteBus {
    pub fn new(name: impl Into<String>, outbound: Outbound) -> Self {
        Self {
            name: name.into(),
            subscribers: Mutex::new(Vec::new()),
            outbound,
            encode: None,
            decode: None,
        }
    }

    /// Adapter applied to payloads on `send`, before the transport.
    pub fn with_encode(mut self, encode: ByteAdapter) -> Self {
        self.encode = Some(encode);
        self
    }

    /// Adapter applied to inbound chunks just before fanout.
    pub fn with_decode(mut self, decode: ByteAdapter) -> Self {
        self.decode = Some(decode);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a sink. Subscribing the same sink twice is a no-op.
    pub fn subscribe(&self, sink: &Arc<dyn BusSink>) {
        let mut subscribers = self.subscribers.lock();
        if !subscribers.iter().any(|s| same_sink(s, sink)) {
            subscribers.push(Arc::clone(sink));
        }
    }

    /// Deregister a sink. No-op when the sink is not subscribed.
    pub fn unsubscribe(&self, sink: &Arc<dyn BusSink>) {
        self.subscribers.lock().retain(|s| !same_sink(s, sink));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Encode (if configured) and hand the payload to the transport.
    pub fn send(&self, payload: &[u8]) -> Result<(), CoreError> {
        tracing::trace!(bus = %self.name, len = payload.len(), "send");
        match &self.encode {
            Some(encode) => (self.outbound)(&encode(payload)),
            None => (self.outbound)(payload),
        }
    }

    /// `send` with a trailing newline; the shape of a request line.
    pub fn sendline(&self, payload: &[u8]) -> Result<(), CoreError> {
        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        line.push(b'\n');
        self.send(&line)
    }

    /// Inbound entry point invoked by the transport.
    ///
    /// Delivers the (decoded) chunk to a snapshot of the subscriber set
    /// taken at entry; a sink registered during the fanout does not see
    /// this chunk. Sink failures are logged and swallowed.
    pub fn on_bytes(&self, chunk: &[u8]) {
        let decoded;
        let data: &[u8] = match &self.decode {
            Some(decode) => {
                decoded = decode(chunk);
                &decoded
            }
            None => chunk,
        };
        let snapshot: Vec<Arc<dyn BusSink>> = self.subscribers.lock().clone();
        tracing::trace!(bus = %self.name, len = data.len(), sinks = snapshot.len(), "fanout");
        for sink in snapshot {
            if let Err(err) = sink.on_bytes(data) {
                tracing::warn!(bus = %self.name, error = %err, "sink failed to consume chunk");
            }
        }
    }
}

impl std::fmt::Debug for ByteBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBus")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

fn same_sink(a: &Arc<dyn BusSink>, b: &Arc<dyn BusSink>) -> bool {
    // Compare allocation addresses; vtable pointers are not stable enough
    // for identity.
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
