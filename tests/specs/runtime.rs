// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime-wide behaviour: admission refusal, shutdown reclamation and
//! the cross-backend observer invariants.

use super::prelude::*;
use lo_core::CoreError;
use lo_observe::{Feed, Observer, Runner, State};
use lo_runner::{Context, FakeProbe};
use std::sync::Arc;
use std::time::Duration;

fn pending(bus: Arc<lo_bus::ByteBus>, runner: Arc<dyn Runner>) -> Observer {
    Observer::new("pending", bus, runner, Box::new(|_: &[u8]| Feed::Pending))
        .with_deadline(Duration::from_secs(30))
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn resource_ceiling_refuses_admission(backend: Backend) {
    let context = Context::with_probe(Arc::new(FakeProbe::new(95, 100)));
    let runner = backend.runner(context);
    let (bus, wire) = bus_with_wire("ceiling");

    let observer = pending(Arc::clone(&bus), runner);
    let handle = observer.start().unwrap();

    assert!(handle.done());
    match handle.result() {
        Err(CoreError::ResourceLimit { open, limit }) => {
            assert_eq!((open, limit), (95, 100));
        }
        other => panic!("expected ResourceLimit, got {other:?}"),
    }
    // refusal must not touch the bus
    assert_eq!(bus.subscriber_count(), 0);
    assert!(wire.sent().is_empty());
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn shutdown_reclaims_eight_observers_on_four_buses(backend: Backend) {
    let runner = backend.runner(Context::new());
    let buses: Vec<_> = (0..4).map(|i| bus_with_wire(&format!("bus-{i}")).0).collect();
    let observers: Vec<_> = (0..8)
        .map(|i| pending(Arc::clone(&buses[i % 4]), Arc::clone(&runner)))
        .collect();
    for observer in &observers {
        observer.start().unwrap();
    }
    for bus in &buses {
        assert_eq!(bus.subscriber_count(), 2);
    }

    runner.shutdown();

    let all_cancelled = wait_until(TICK_PLUS_SLACK, || {
        observers.iter().all(|o| o.state() == State::Cancelled)
    });
    assert!(all_cancelled, "every observer must be cancelled after shutdown");
    let all_unsubscribed =
        wait_until(TICK_PLUS_SLACK, || buses.iter().all(|b| b.subscriber_count() == 0));
    assert!(all_unsubscribed, "every bus must be empty after shutdown");
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn no_chunk_between_submit_and_first_tick_is_lost(backend: Backend) {
    let runner = backend.runner(Context::new());
    let (bus, _wire) = bus_with_wire("fast");
    let observer = Observer::new(
        "fast",
        Arc::clone(&bus),
        runner,
        Box::new(|chunk: &[u8]| {
            if chunk == b"immediate" {
                Feed::Done(serde_json::json!({ "seen": true }))
            } else {
                Feed::Pending
            }
        }),
    );
    let handle = observer.start().unwrap();

    // delivered on the fanout path before any progress tick has run
    bus.on_bytes(b"immediate");

    assert_eq!(handle.result().unwrap()["seen"], true);
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn terminal_state_is_forever(backend: Backend) {
    let runner = backend.runner(Context::new());
    let (bus, _wire) = bus_with_wire("sticky");
    let observer = pending(Arc::clone(&bus), runner);
    let handle = observer.start().unwrap();

    handle.cancel();
    handle.join(Some(Duration::from_secs(1))).unwrap();
    assert_eq!(observer.state(), State::Cancelled);

    // later data and later cancellations change nothing
    bus.on_bytes(b"too late");
    observer.set_result(serde_json::json!({ "late": true }));
    observer.cancel();
    assert_eq!(observer.state(), State::Cancelled);
    assert!(matches!(observer.result(), Err(CoreError::Cancelled)));
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn zero_deadline_fails_on_first_tick(backend: Backend) {
    let runner = backend.runner(Context::new());
    let (bus, _wire) = bus_with_wire("zero");
    let observer = pending(Arc::clone(&bus), runner).with_deadline(Duration::ZERO);
    let handle = observer.start().unwrap();

    handle.join(Some(Duration::from_secs(1))).unwrap();

    assert!(matches!(observer.result(), Err(CoreError::Timeout { .. })));
}

#[test]
fn runners_allocate_distinct_ids_from_one_context() {
    let context = Context::new();
    let first = Backend::Threaded.runner(Arc::clone(&context));
    let second = Backend::Threaded.runner(context);
    assert_ne!(first.id(), second.id());
}
