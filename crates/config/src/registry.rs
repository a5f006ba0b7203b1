// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loaded-configuration state and reload semantics.
//!
//! Reloading the identical document is a no-op. Reloading a different
//! document appends new devices only: logging and connections keep their
//! first-load values.

use crate::document::{ConnectionDesc, Document};
use crate::error::ConfigError;
use crate::logger;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

/// What a `load` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// First document: logger, connections and devices applied.
    Loaded,
    /// Identical document seen before: nothing changed.
    Unchanged,
    /// Different document: new devices appended only.
    DevicesAppended,
}

/// A device definition with any clone source resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDevice {
    pub device_class: String,
    pub connection_desc: Option<ConnectionDesc>,
    pub connection_hops: BTreeMap<String, toml::Value>,
    pub initial_state: Option<String>,
    pub cloned_from: Option<String>,
}

#[derive(Default)]
pub struct Registry {
    loaded: Mutex<Vec<Document>>,
    connections: Mutex<BTreeMap<String, ConnectionDesc>>,
    default_variants: Mutex<BTreeMap<String, String>>,
    default_connection: Mutex<Option<ConnectionDesc>>,
    devices: Mutex<BTreeMap<String, ResolvedDevice>>,
    topology: Mutex<BTreeMap<String, BTreeSet<String>>>,
    create_at_startup: Mutex<Vec<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, document: Document) -> Result<LoadOutcome, ConfigError> {
        let first_load = {
            let loaded = self.loaded.lock();
            if loaded.iter().any(|seen| *seen == document) {
                tracing::debug!("configuration already loaded; nothing to do");
                return Ok(LoadOutcome::Unchanged);
            }
            loaded.is_empty()
        };

        if first_load {
            if let Some(logger_config) = &document.logger {
                logger::init(logger_config)?;
            }
            self.load_connections(&document);
        }
        self.load_devices(&document)?;

        self.loaded.lock().push(document);
        Ok(if first_load { LoadOutcome::Loaded } else { LoadOutcome::DevicesAppended })
    }

    fn load_connections(&self, document: &Document) {
        let mut connections = self.connections.lock();
        for (name, desc) in &document.named_connections {
            tracing::debug!(connection = %name, io_type = %desc.io_type, "defined connection");
            connections.insert(name.clone(), desc.clone());
        }
        self.default_variants
            .lock()
            .extend(document.io_types.default_variant.clone());
        if let Some(default_connection) = &document.devices.default_connection {
            *self.default_connection.lock() = Some(default_connection.connection_desc.clone());
        }
    }

    fn load_devices(&self, document: &Document) -> Result<(), ConfigError> {
        let mut devices = self.devices.lock();

        // validate before touching state so a bad document changes nothing
        for name in document.devices.entries.keys() {
            if devices.contains_key(name) {
                return Err(ConfigError::DeviceExists(name.clone()));
            }
        }

        let mut added: BTreeMap<String, ResolvedDevice> = BTreeMap::new();
        let mut clones: Vec<(&String, &crate::document::DeviceDef)> = Vec::new();
        for (name, def) in &document.devices.entries {
            if def.cloned_from.is_some() {
                clones.push((name, def));
                continue;
            }
            let connection_desc = def
                .connection_desc
                .clone()
                .or_else(|| self.default_connection.lock().clone());
            added.insert(
                name.clone(),
                ResolvedDevice {
                    device_class: def.device_class.clone().unwrap_or_default(),
                    connection_desc,
                    connection_hops: def.connection_hops.clone(),
                    initial_state: def.initial_state.clone(),
                    cloned_from: None,
                },
            );
        }

        for (name, def) in clones {
            let source_name = def.cloned_from.clone().unwrap_or_default();
            let source = added
                .get(&source_name)
                .or_else(|| devices.get(&source_name))
                .ok_or_else(|| ConfigError::UnknownCloneSource {
                    name: name.clone(),
                    source_name: source_name.clone(),
                })?;
            let mut resolved = source.clone();
            resolved.cloned_from = Some(source_name);
            if def.initial_state.is_some() {
                resolved.initial_state = def.initial_state.clone();
            }
            added.insert(name.clone(), resolved);
        }

        // topology may only reference devices that exist after this load
        for (name, neighbours) in &document.devices.logical_topology {
            for device in std::iter::once(name).chain(neighbours.iter()) {
                if !added.contains_key(device) && !devices.contains_key(device) {
                    return Err(ConfigError::UnknownDevice(device.clone()));
                }
            }
        }

        if document.devices.create_at_startup {
            self.create_at_startup.lock().extend(added.keys().cloned());
        }
        for name in added.keys() {
            tracing::debug!(device = %name, "defined device");
        }
        devices.extend(added);

        let mut topology = self.topology.lock();
        for (name, neighbours) in &document.devices.logical_topology {
            for neighbour in neighbours {
                topology.entry(name.clone()).or_default().insert(neighbour.clone());
                topology.entry(neighbour.clone()).or_default().insert(name.clone());
            }
        }
        Ok(())
    }

    pub fn connection(&self, name: &str) -> Option<ConnectionDesc> {
        self.connections.lock().get(name).cloned()
    }

    pub fn default_variant(&self, io_type: &str) -> Option<String> {
        self.default_variants.lock().get(io_type).cloned()
    }

    pub fn default_connection(&self) -> Option<ConnectionDesc> {
        self.default_connection.lock().clone()
    }

    pub fn device(&self, name: &str) -> Option<ResolvedDevice> {
        self.devices.lock().get(name).cloned()
    }

    pub fn device_names(&self) -> Vec<String> {
        self.devices.lock().keys().cloned().collect()
    }

    pub fn neighbours(&self, name: &str) -> Vec<String> {
        self.topology
            .lock()
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Devices flagged for creation at startup, in definition order.
    pub fn create_at_startup(&self) -> Vec<String> {
        self.create_at_startup.lock().clone()
    }

    /// Forget everything; test hook.
    pub fn clear(&self) {
        self.loaded.lock().clear();
        self.connections.lock().clear();
        self.default_variants.lock().clear();
        *self.default_connection.lock() = None;
        self.devices.lock().clear();
        self.topology.lock().clear();
        self.create_at_startup.lock().clear();
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
