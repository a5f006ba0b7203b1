// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal runner stub for exercising observers without a backend.

use crate::handle::Handle;
use crate::observer::Observer;
use crate::runner::Runner;
use lo_bus::test_support::FakeWire;
use lo_bus::ByteBus;
use lo_core::{CoreError, RunnerId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn test_bus() -> (Arc<ByteBus>, FakeWire) {
    let wire = FakeWire::new();
    let bus = Arc::new(ByteBus::new("test", wire.outbound()));
    (bus, wire)
}

/// Runner that schedules nothing; tests drive observers by hand.
#[derive(Default)]
pub struct StubRunner {
    in_shutdown: AtomicBool,
}

impl StubRunner {
    pub fn arc() -> Arc<dyn Runner> {
        Arc::new(Self::default())
    }
}

impl Runner for StubRunner {
    fn id(&self) -> RunnerId {
        RunnerId::new(0)
    }

    fn submit(&self, observer: &Observer) -> Handle {
        if let Some(request) = observer.request_line() {
            if let Err(error) = observer.bus().sendline(&request) {
                observer.set_exception(error);
            }
        }
        Handle::new(observer.clone(), observer.runner())
    }

    fn wait(&self, handle: &Handle, timeout: Option<Duration>) -> Result<(), CoreError> {
        if !handle.observer().wait_terminal(timeout) {
            let limit = timeout.unwrap_or_default();
            handle.observer().set_exception(CoreError::await_timeout(limit, limit));
            handle.cancel();
        }
        Ok(())
    }

    fn shutdown(&self) {
        self.in_shutdown.store(true, Ordering::SeqCst);
    }

    fn in_shutdown(&self) -> bool {
        self.in_shutdown.load(Ordering::SeqCst)
    }
}
