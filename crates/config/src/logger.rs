// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tracing-subscriber setup driven by the LOGGER section.
//!
//! Logging is initialized at most once per process; later loads keep the
//! first configuration.

use crate::document::{LogMode, LoggerConfig};
use crate::error::ConfigError;
use std::fs::OpenOptions;
use std::sync::Once;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Apply the LOGGER section. Safe to call repeatedly; only the first
/// call in the process installs a subscriber.
pub fn init(config: &LoggerConfig) -> Result<(), ConfigError> {
    let mut outcome = Ok(());
    INIT.call_once(|| {
        outcome = install(config);
    });
    outcome
}

fn install(config: &LoggerConfig) -> Result<(), ConfigError> {
    let filter = build_filter(config)?;
    let timer = match &config.date_format {
        Some(format) => ChronoLocal::new(format.clone()),
        None => ChronoLocal::rfc_3339(),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_ansi(false);

    match &config.path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(config.mode == LogMode::Append)
                .write(true)
                .truncate(config.mode == LogMode::Write)
                .open(path)
                .map_err(|error| ConfigError::Logger(format!("{}: {error}", path.display())))?;
            builder
                .with_writer(std::sync::Mutex::new(file))
                .try_init()
                .map_err(|error| ConfigError::Logger(error.to_string()))
        }
        None => builder
            .try_init()
            .map_err(|error| ConfigError::Logger(error.to_string())),
    }
}

/// Level filter from DEBUG_LEVEL, widened to byte-level tracing of bus
/// traffic when RAW_LOG is set.
fn build_filter(config: &LoggerConfig) -> Result<EnvFilter, ConfigError> {
    let base = config.debug_level.as_deref().unwrap_or("info");
    let directives = if config.raw_log {
        format!("{base},lo_bus=trace")
    } else {
        base.to_string()
    };
    EnvFilter::try_new(&directives)
        .map_err(|error| ConfigError::Logger(format!("bad DEBUG_LEVEL '{directives}': {error}")))
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
