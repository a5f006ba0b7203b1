// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two independent observers watching one bus for opposite ping
//! verdicts, on every backend.

use super::prelude::*;
use lo_observe::{LineWatch, Observer};
use std::sync::Arc;
use std::time::Duration;

const PING_HEADER: &[u8] = b"PING 10.0.2.15 (10.0.2.15) 56(84) bytes of data.\n";
const PING_REPLY_1: &[u8] = b"64 bytes from 10.0.2.15: icmp_req=1 ttl=64 time=0.380 ms\n";
const PING_REPLY_7: &[u8] = b"64 bytes from 10.0.2.15: icmp_req=7 ttl=64 time=0.410 ms\n";
const PING_UNREACHABLE: &[u8] = b"ping: sendmsg: Network is unreachable\n";

const DOWN_NEEDLE: &str = "ping: sendmsg: Network is unreachable";
const UP_NEEDLE: &str = "64 bytes from 10.0.2.15: icmp_req=";

fn watcher(bus: Arc<lo_bus::ByteBus>, runner: Arc<dyn lo_observe::Runner>, needle: &str) -> Observer {
    Observer::new(
        format!("watch:{needle}"),
        bus,
        runner,
        Box::new(LineWatch::new(needle)),
    )
    .with_deadline(Duration::from_secs(30))
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn down_and_up_watch_the_same_ping_stream(backend: Backend) {
    let context = lo_runner::Context::new();
    let runner = backend.runner(context);
    let (bus, _wire) = bus_with_wire("ping");

    let down = watcher(Arc::clone(&bus), Arc::clone(&runner), DOWN_NEEDLE);
    let up = watcher(Arc::clone(&bus), Arc::clone(&runner), UP_NEEDLE);
    let down_handle = down.start().unwrap();
    let up_handle = up.start().unwrap();

    bus.on_bytes(PING_HEADER);
    assert!(!down.done());
    assert!(!up.done());

    // second chunk: the Up observer captures its result
    bus.on_bytes(PING_REPLY_1);
    assert!(up.done());
    assert!(!down.done());
    let up_result = up_handle.result().unwrap();
    assert_eq!(up_result["line"], String::from_utf8_lossy(PING_REPLY_1).trim_end());

    // third chunk: ping reports the network gone; Down fires with the
    // wall clock of that chunk
    let before_ms = now_ms();
    bus.on_bytes(PING_UNREACHABLE);
    let after_ms = now_ms();

    let down_result = down_handle.result().unwrap();
    assert_eq!(down_result["line"], DOWN_NEEDLE);
    let matched_ms = down_result["time_ms"].as_u64().unwrap();
    assert!(matched_ms >= before_ms && matched_ms <= after_ms);

    // interface back up: a re-created Up observer catches a later reply
    let up_again = watcher(Arc::clone(&bus), Arc::clone(&runner), UP_NEEDLE);
    let up_again_handle = up_again.start().unwrap();
    bus.on_bytes(PING_REPLY_7);
    let again = up_again_handle.result().unwrap();
    assert!(again["line"].as_str().unwrap().contains("icmp_req=7"));

    runner.shutdown();
    assert_eq!(bus.subscriber_count(), 0);
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
