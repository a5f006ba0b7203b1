// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lo-transport: byte-oriented duplex channels feeding a bus.
//!
//! A transport's inbound side delivers chunks to `ByteBus::on_bytes`;
//! its outbound side is handed to the bus as a send closure. Transports
//! release their resources on drop, so a bus outlives transport
//! open/close cycles without leaking reader tasks.

pub mod memory;
pub mod tcp;

use async_trait::async_trait;
use lo_bus::{ByteBus, Outbound};
use lo_core::CoreError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport already opened")]
    AlreadyOpen,

    #[error("transport is closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),
}

impl From<TransportError> for CoreError {
    fn from(error: TransportError) -> Self {
        CoreError::Transport(error.to_string())
    }
}

/// One duplex byte channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start moving bytes: inbound chunks go to `bus.on_bytes` until the
    /// channel closes.
    async fn open(&self, bus: Arc<ByteBus>) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;

    fn send(&self, payload: &[u8]) -> Result<(), TransportError>;
}

/// The send closure a bus is constructed over.
pub fn outbound_of(transport: Arc<dyn Transport>) -> Outbound {
    Box::new(move |payload| transport.send(payload).map_err(CoreError::from))
}

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;
