// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serde model of the configuration document.
//!
//! Key casing follows the document format, not Rust convention; serde
//! renames keep the Rust side idiomatic. `PartialEq` everywhere so the
//! registry can deep-compare a reload against what is already loaded.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Document {
    #[serde(rename = "NAMED_CONNECTIONS", default)]
    pub named_connections: BTreeMap<String, ConnectionDesc>,

    #[serde(rename = "IO_TYPES", default)]
    pub io_types: IoTypes,

    #[serde(rename = "DEVICES", default)]
    pub devices: Devices,

    #[serde(rename = "LOGGER", default)]
    pub logger: Option<LoggerConfig>,
}

impl Document {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read a document from disk; the path must be absolute.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_absolute() {
            return Err(ConfigError::RelativePath(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Read a document from the file named by an environment variable.
    pub fn from_env(var: &str) -> Result<Self, ConfigError> {
        let path = std::env::var(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))?;
        Self::from_path(Path::new(&path))
    }
}

/// One named connection: its io type plus endpoint details.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectionDesc {
    pub io_type: String,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Whatever else the io type needs; passed through untyped.
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct IoTypes {
    #[serde(default)]
    pub default_variant: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Devices {
    #[serde(rename = "DEFAULT_CONNECTION", default)]
    pub default_connection: Option<DefaultConnection>,

    #[serde(rename = "CREATE_AT_STARTUP", default)]
    pub create_at_startup: bool,

    #[serde(rename = "LOGICAL_TOPOLOGY", default)]
    pub logical_topology: BTreeMap<String, Vec<String>>,

    /// Every remaining key under DEVICES is a device definition.
    #[serde(flatten)]
    pub entries: BTreeMap<String, DeviceDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefaultConnection {
    #[serde(rename = "CONNECTION_DESC")]
    pub connection_desc: ConnectionDesc,
}

/// A device definition, direct or cloned.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DeviceDef {
    #[serde(rename = "DEVICE_CLASS", default)]
    pub device_class: Option<String>,

    #[serde(rename = "CONNECTION_DESC", default)]
    pub connection_desc: Option<ConnectionDesc>,

    #[serde(rename = "CONNECTION_HOPS", default)]
    pub connection_hops: BTreeMap<String, toml::Value>,

    #[serde(rename = "INITIAL_STATE", default)]
    pub initial_state: Option<String>,

    #[serde(rename = "CLONED_FROM", default)]
    pub cloned_from: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    #[default]
    Append,
    Write,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LoggerConfig {
    #[serde(rename = "MODE", default)]
    pub mode: LogMode,

    #[serde(rename = "PATH", default)]
    pub path: Option<PathBuf>,

    #[serde(rename = "RAW_LOG", default)]
    pub raw_log: bool,

    #[serde(rename = "DEBUG_LEVEL", default)]
    pub debug_level: Option<String>,

    #[serde(rename = "DATE_FORMAT", default)]
    pub date_format: Option<String>,
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
