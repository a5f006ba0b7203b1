// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by the backend test files.

use lo_bus::test_support::FakeWire;
use lo_bus::ByteBus;
use lo_observe::{Feed, Observer, Runner};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub fn test_bus(name: &str) -> (Arc<ByteBus>, FakeWire) {
    let wire = FakeWire::new();
    let bus = Arc::new(ByteBus::new(name, wire.outbound()));
    (bus, wire)
}

/// Observer that never completes on data; deadline-driven tests.
pub fn pending_observer(bus: Arc<ByteBus>, runner: Arc<dyn Runner>) -> Observer {
    Observer::new("pending", bus, runner, Box::new(|_: &[u8]| Feed::Pending))
        .with_deadline(Duration::from_secs(60))
}

/// Observer completing when `needle` shows up in a chunk.
pub fn matching_observer(
    bus: Arc<ByteBus>,
    runner: Arc<dyn Runner>,
    needle: &'static [u8],
) -> Observer {
    let feeder = move |chunk: &[u8]| {
        if chunk.windows(needle.len()).any(|w| w == needle) {
            Feed::Done(json!({ "matched": String::from_utf8_lossy(needle) }))
        } else {
            Feed::Pending
        }
    };
    Observer::new("matching", bus, runner, Box::new(feeder)).with_deadline(Duration::from_secs(60))
}

/// Poll `condition` for up to `limit`.
pub fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
