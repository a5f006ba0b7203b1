// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::feed::Feed;
use crate::test_util::{test_bus, StubRunner};
use lo_core::{CoreError, FakeClock, SystemClock};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn pending_observer() -> Observer {
    let (bus, _wire) = test_bus();
    Observer::new("watch", bus, StubRunner::arc(), Box::new(|_: &[u8]| Feed::Pending))
}

/// Feeder that counts calls and completes on a needle.
fn counting_feeder(calls: Arc<AtomicUsize>, needle: &'static [u8]) -> Box<dyn Feeder> {
    Box::new(move |chunk: &[u8]| {
        calls.fetch_add(1, Ordering::SeqCst);
        if chunk.windows(needle.len()).any(|w| w == needle) {
            Feed::Done(json!({ "matched": true }))
        } else {
            Feed::Pending
        }
    })
}

#[test]
fn new_observer_is_unstarted() {
    let observer = pending_observer();
    assert_eq!(observer.state(), State::Unstarted);
    assert!(!observer.done());
    assert!(observer.started_at().is_none());
}

#[test]
fn start_transitions_to_running_and_stamps_time() {
    let observer = pending_observer();
    observer.start().unwrap();
    assert_eq!(observer.state(), State::Running);
    assert!(observer.started_at().is_some());
}

#[test]
fn double_start_is_wrong_usage() {
    let observer = pending_observer();
    observer.start().unwrap();
    match observer.start() {
        Err(CoreError::WrongUsage(msg)) => assert!(msg.contains("started twice"), "got: {msg}"),
        other => panic!("expected WrongUsage, got {other:?}"),
    }
}

#[test]
fn terminal_states_are_sticky() {
    let observer = pending_observer();
    observer.start().unwrap();
    observer.set_result(json!({ "first": 1 }));
    observer.set_exception(CoreError::Other("late".into()));
    observer.cancel();
    assert_eq!(observer.state(), State::Succeeded);
    assert_eq!(observer.result().unwrap(), json!({ "first": 1 }));
}

#[test]
fn cancel_after_terminal_preserves_state() {
    let observer = pending_observer();
    observer.start().unwrap();
    observer.set_exception(CoreError::Other("boom".into()));
    observer.cancel();
    assert_eq!(observer.state(), State::Failed);
}

#[test]
fn result_before_done_is_wrong_usage() {
    let observer = pending_observer();
    observer.start().unwrap();
    assert!(matches!(observer.result(), Err(CoreError::WrongUsage(_))));
}

#[test]
fn result_reraises_stored_failure() {
    let observer = pending_observer();
    observer.start().unwrap();
    observer.set_exception(CoreError::Transport("gone".into()));
    assert!(matches!(observer.result(), Err(CoreError::Transport(_))));
    // re-raised to every caller that asks
    assert!(matches!(observer.result(), Err(CoreError::Transport(_))));
}

#[test]
fn cancelled_result_raises_cancelled() {
    let observer = pending_observer();
    observer.start().unwrap();
    observer.cancel();
    assert!(matches!(observer.result(), Err(CoreError::Cancelled)));
}

#[test]
fn feed_chunk_sets_result_on_match() {
    let (bus, _wire) = test_bus();
    let calls = Arc::new(AtomicUsize::new(0));
    let observer = Observer::new(
        "watch",
        bus,
        StubRunner::arc(),
        counting_feeder(Arc::clone(&calls), b"OK"),
    );
    observer.start().unwrap();

    observer.feed_chunk(b"noise", &SystemClock);
    assert_eq!(observer.state(), State::Running);

    observer.feed_chunk(b"then OK", &SystemClock);
    assert_eq!(observer.state(), State::Succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn post_terminal_chunks_are_discarded() {
    let (bus, _wire) = test_bus();
    let calls = Arc::new(AtomicUsize::new(0));
    let observer = Observer::new(
        "watch",
        bus,
        StubRunner::arc(),
        counting_feeder(Arc::clone(&calls), b"OK"),
    );
    observer.start().unwrap();
    observer.feed_chunk(b"OK", &SystemClock);
    observer.feed_chunk(b"late OK", &SystemClock);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_deadline_times_out_without_feeding() {
    let (bus, _wire) = test_bus();
    let calls = Arc::new(AtomicUsize::new(0));
    let observer = Observer::new(
        "watch",
        bus,
        StubRunner::arc(),
        counting_feeder(Arc::clone(&calls), b"OK"),
    )
    .with_deadline(Duration::ZERO);
    observer.start().unwrap();

    observer.feed_chunk(b"OK", &SystemClock);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    match observer.result() {
        Err(CoreError::Timeout { kind, .. }) => assert_eq!(kind, lo_core::TimeoutKind::Deadline),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[test]
fn deadline_is_read_live() {
    let clock = FakeClock::new();
    let observer = pending_observer().with_deadline(Duration::from_secs(5));
    observer.start().unwrap();

    clock.advance(Duration::from_secs(4));
    assert!(!observer.expire_if_due(&clock));

    // extended while running; the old deadline must not fire
    observer.set_deadline(Duration::from_secs(60));
    clock.advance(Duration::from_secs(10));
    assert!(!observer.expire_if_due(&clock));

    clock.advance(Duration::from_secs(60));
    assert!(observer.expire_if_due(&clock));
    assert_eq!(observer.state(), State::Failed);
}

#[test]
fn expire_if_due_reports_terminal_state() {
    let clock = FakeClock::new();
    let observer = pending_observer().with_deadline(Duration::from_secs(1));
    observer.start().unwrap();
    observer.cancel();
    clock.advance(Duration::from_secs(5));
    // already terminal; expiry must not overwrite cancellation
    assert!(observer.expire_if_due(&clock));
    assert_eq!(observer.state(), State::Cancelled);
}

#[test]
fn wait_terminal_times_out_while_running() {
    let observer = pending_observer();
    observer.start().unwrap();
    assert!(!observer.wait_terminal(Some(Duration::from_millis(20))));
}

#[test]
fn wait_terminal_returns_on_result_from_another_thread() {
    let observer = pending_observer();
    observer.start().unwrap();
    let remote = observer.clone();
    let setter = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        remote.set_result(json!({}));
    });
    assert!(observer.wait_terminal(Some(Duration::from_secs(5))));
    setter.join().unwrap();
}

#[tokio::test]
async fn terminated_resolves_cooperatively() {
    let observer = pending_observer();
    observer.start().unwrap();
    let remote = observer.clone();
    let setter = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        remote.set_result(json!({ "ok": true }));
    });
    observer.terminated().await;
    assert_eq!(observer.result().unwrap(), json!({ "ok": true }));
    setter.join().unwrap();
}
