// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration document loading and reload semantics.

use lo_config::{Document, LoadOutcome, Registry};
use serial_test::serial;
use std::io::Write;

const SITE_CONFIG: &str = r#"
[NAMED_CONNECTIONS.www]
io_type = "tcp"
host = "localhost"
port = 2345

[IO_TYPES.default_variant]
tcp = "asyncio"

[DEVICES.gateway]
DEVICE_CLASS = "unix.gateway"

[DEVICES.gateway.CONNECTION_DESC]
io_type = "tcp"
host = "10.0.0.1"
port = 22
"#;

#[test]
fn reloading_identical_document_is_noop() {
    let registry = Registry::new();
    let doc = Document::from_toml_str(SITE_CONFIG).unwrap();
    assert_eq!(registry.load(doc.clone()).unwrap(), LoadOutcome::Loaded);
    assert_eq!(registry.load(doc).unwrap(), LoadOutcome::Unchanged);
    assert_eq!(registry.device_names().len(), 1);
}

#[test]
fn reloading_different_document_appends_devices_only() {
    let registry = Registry::new();
    registry.load(Document::from_toml_str(SITE_CONFIG).unwrap()).unwrap();

    let second = r#"
[NAMED_CONNECTIONS.late]
io_type = "serial"

[DEVICES.modem]
DEVICE_CLASS = "at.modem"
"#;
    let outcome = registry.load(Document::from_toml_str(second).unwrap()).unwrap();

    assert_eq!(outcome, LoadOutcome::DevicesAppended);
    assert!(registry.device("modem").is_some());
    assert!(registry.device("gateway").is_some());
    // connections from the second document are not applied
    assert!(registry.connection("late").is_none());
}

#[test]
#[serial]
fn document_loads_through_env_var_indirection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lookout.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(SITE_CONFIG.as_bytes()).unwrap();

    std::env::set_var("LOOKOUT_SPEC_CONFIG", &path);
    let doc = Document::from_env("LOOKOUT_SPEC_CONFIG").unwrap();
    std::env::remove_var("LOOKOUT_SPEC_CONFIG");

    assert_eq!(doc.named_connections["www"].port, Some(2345));
}

#[test]
fn missing_env_var_is_reported() {
    assert!(Document::from_env("LOOKOUT_SPEC_NO_SUCH_VAR").is_err());
}
