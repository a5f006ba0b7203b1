// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the spec modules.

#![allow(dead_code)]

use lo_bus::test_support::FakeWire;
use lo_bus::ByteBus;
use lo_observe::Runner;
use lo_runner::{Context, InlineRunner, LoopRunner, ThreadRunner};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One tick of a runner's progress task plus scheduling slack.
pub const TICK_PLUS_SLACK: Duration = Duration::from_millis(55);

/// The three interchangeable execution backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Threaded,
    Inline,
    LoopThread,
}

impl Backend {
    pub fn runner(self, context: Arc<Context>) -> Arc<dyn Runner> {
        match self {
            Backend::Threaded => ThreadRunner::new(context),
            Backend::Inline => InlineRunner::new(context).expect("inline scheduler should build"),
            Backend::LoopThread => LoopRunner::new(context).expect("loop thread should start"),
        }
    }
}

pub fn bus_with_wire(name: &str) -> (Arc<ByteBus>, FakeWire) {
    let wire = FakeWire::new();
    let bus = Arc::new(ByteBus::new(name, wire.outbound()));
    (bus, wire)
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
