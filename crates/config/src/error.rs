// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration error kinds.

use lo_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("loading configuration requires an absolute path, not '{0}'")]
    RelativePath(String),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("device '{0}' is already defined")]
    DeviceExists(String),

    #[error("clone source '{source_name}' for device '{name}' is not defined")]
    UnknownCloneSource { name: String, source_name: String },

    #[error("topology references unknown device '{0}'")]
    UnknownDevice(String),

    #[error("failed to initialize logging: {0}")]
    Logger(String),
}

impl From<ConfigError> for CoreError {
    fn from(error: ConfigError) -> Self {
        CoreError::Config(error.to_string())
    }
}
