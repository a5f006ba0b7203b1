// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command round-trips: request line out, reply recognition, timeouts,
//! erroneous replies. Run against every backend.

use super::prelude::*;
use lo_core::{CoreError, TimeoutKind};
use lo_observe::{Command, Runner, State};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn attach_command(
    bus: Arc<lo_bus::ByteBus>,
    runner: Arc<dyn Runner>,
    deadline: Duration,
) -> Command {
    Command::builder(bus, runner, "AT+CGATT=1")
        .complete_on("\nOK\n")
        .fail_on("ERROR")
        .requires_result(false)
        .deadline(deadline)
        .build()
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn send_and_receive(backend: Backend) {
    let runner = backend.runner(lo_runner::Context::new());
    let (bus, wire) = bus_with_wire("at");
    let command = attach_command(Arc::clone(&bus), Arc::clone(&runner), Duration::from_secs(5));

    let handle = command.start().unwrap();

    // the request line went out during submit
    assert_eq!(wire.sent(), vec![b"AT+CGATT=1\n".to_vec()]);

    bus.on_bytes(b"AT+CGATT=1\nOK\n");

    assert_eq!(handle.result().unwrap(), serde_json::json!({}));
    assert_eq!(command.observer().state(), State::Succeeded);
    runner.shutdown();
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn times_out_with_no_reply(backend: Backend) {
    let runner = backend.runner(lo_runner::Context::new());
    let (bus, _wire) = bus_with_wire("at");
    let command = attach_command(Arc::clone(&bus), Arc::clone(&runner), Duration::from_secs(1));

    let handle = command.start().unwrap();
    let waited_from = Instant::now();
    handle.join(None).unwrap();
    let waited = waited_from.elapsed();

    assert!(waited >= Duration::from_millis(990), "returned after {waited:?}");
    assert!(waited < Duration::from_millis(1200), "returned after {waited:?}");
    match command.observer().result() {
        Err(CoreError::Timeout { kind, .. }) => assert_eq!(kind, TimeoutKind::Deadline),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert_eq!(command.output(), "");
    runner.shutdown();
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn erroneous_reply_fails_the_command(backend: Backend) {
    let runner = backend.runner(lo_runner::Context::new());
    let (bus, _wire) = bus_with_wire("at");
    let command = attach_command(Arc::clone(&bus), Arc::clone(&runner), Duration::from_secs(5));

    let handle = command.start().unwrap();
    bus.on_bytes(b"AT+CGATT=1\nERROR");

    match handle.result() {
        Err(CoreError::CommandFailure { command: name, output }) => {
            assert_eq!(name, "AT+CGATT=1");
            assert!(output.contains("ERROR"));
        }
        other => panic!("expected CommandFailure, got {other:?}"),
    }
    runner.shutdown();
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn caller_bound_shorter_than_deadline(backend: Backend) {
    let runner = backend.runner(lo_runner::Context::new());
    let (bus, _wire) = bus_with_wire("at");
    let command = attach_command(Arc::clone(&bus), Arc::clone(&runner), Duration::from_secs(30));

    let handle = command.start().unwrap();
    handle.join(Some(Duration::from_millis(60))).unwrap();

    // the caller sees a timeout and the observer is already terminal
    assert!(command.observer().done());
    match command.observer().result() {
        Err(CoreError::Timeout { kind, .. }) => assert_eq!(kind, TimeoutKind::AwaitBound),
        other => panic!("expected Timeout, got {other:?}"),
    }
    runner.shutdown();
}

#[yare::parameterized(
    threaded    = { Backend::Threaded },
    inline      = { Backend::Inline },
    loop_thread = { Backend::LoopThread },
)]
fn deadline_extension_keeps_a_slow_reply_alive(backend: Backend) {
    let runner = backend.runner(lo_runner::Context::new());
    let (bus, _wire) = bus_with_wire("at");
    let command = attach_command(Arc::clone(&bus), Arc::clone(&runner), Duration::from_millis(80));

    let handle = command.start().unwrap();
    // domain code learns the attach is slow and extends the deadline
    command.observer().set_deadline(Duration::from_secs(10));

    std::thread::sleep(Duration::from_millis(150));
    assert!(!command.observer().done(), "extended deadline must govern");

    bus.on_bytes(b"AT+CGATT=1\nOK\n");
    assert_eq!(handle.result().unwrap(), serde_json::json!({}));
    runner.shutdown();
}
