// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP transport.
//!
//! A reader task feeds the bus; a writer task drains the outbound queue.
//! `send` only enqueues, so the bus can be wired up before the socket is
//! connected and command lines written during submit never block on IO.

use crate::{Transport, TransportError};
use async_trait::async_trait;
use lo_bus::ByteBus;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

const READ_CHUNK: usize = 4096;

pub struct TcpTransport {
    addr: String,
    outbound_tx: mpsc::UnboundedSender<Vec<u8>>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
    tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Arc<Self> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            addr: addr.into(),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&self, bus: Arc<ByteBus>) -> Result<(), TransportError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| TransportError::Connect { addr: self.addr.clone(), source })?;
        let (mut read_half, mut write_half) = stream.into_split();

        let mut outbound_rx = self
            .outbound_rx
            .lock()
            .take()
            .ok_or(TransportError::AlreadyOpen)?;

        let writer_addr = self.addr.clone();
        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(error) = write_half.write_all(&frame).await {
                    tracing::warn!(addr = %writer_addr, error = %error, "tcp write failed");
                    break;
                }
            }
        });

        let reader_addr = self.addr.clone();
        let reader = tokio::spawn(async move {
            let mut buffer = [0u8; READ_CHUNK];
            loop {
                match read_half.read(&mut buffer).await {
                    Ok(0) => {
                        tracing::debug!(addr = %reader_addr, bus = %bus.name(), "peer closed");
                        break;
                    }
                    Ok(n) => bus.on_bytes(&buffer[..n]),
                    Err(error) => {
                        tracing::warn!(addr = %reader_addr, error = %error, "tcp read failed");
                        break;
                    }
                }
            }
        });

        self.tasks.lock().extend([writer, reader]);
        tracing::debug!(addr = %self.addr, "tcp transport open");
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        tracing::debug!(addr = %self.addr, "tcp transport closed");
        Ok(())
    }

    /// Enqueue a frame; it is flushed once the writer task runs. Fails
    /// only after close has torn the writer down.
    fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.outbound_tx
            .send(payload.to_vec())
            .map_err(|_| TransportError::Closed)
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        // release on every exit path, scoped-resource style
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tcp_tests.rs"]
mod tests;
