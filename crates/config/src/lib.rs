// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lo-config: the declarative configuration document and its registry.
//!
//! A document names connections, io-type defaults, devices and logging.
//! Reloading the identical document is a no-op; reloading a different
//! one appends new devices only and never re-initializes logging or
//! connections.

pub mod document;
pub mod error;
pub mod logger;
pub mod registry;

pub use document::{
    ConnectionDesc, DeviceDef, Devices, Document, IoTypes, LogMode, LoggerConfig,
};
pub use error::ConfigError;
pub use registry::{LoadOutcome, Registry, ResolvedDevice};
