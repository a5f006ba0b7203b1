// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lo-bus: named in-process publish/subscribe point over one duplex byte
//! transport.
//!
//! Inbound bytes fan out to every subscribed sink; `send` pushes bytes
//! toward the transport. Optional byte adapters translate traffic on the
//! way in and out.

pub mod bus;
pub mod codec;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bus::{BusSink, ByteBus, Outbound, SinkError};
pub use codec::ByteAdapter;
