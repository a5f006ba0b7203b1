// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress machinery shared by all backends.
//!
//! A progress task's job, whatever thread or scheduler it runs on:
//! keep the data path alive (sink subscribed), progress the observer by
//! time (deadline, shutdown) and tear the path down when the observer is
//! terminal. Progressing by data happens in the sink, on the transport's
//! fanout path.

use crate::context::Context;
use lo_bus::{BusSink, SinkError};
use lo_core::{Clock, CoreError};
use lo_observe::{Handle, Observer};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cadence of the progress check.
pub(crate) const TICK: Duration = Duration::from_millis(5);

/// How long shutdown drives a scheduler so progress tasks can exit.
pub(crate) const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Sink installed on the observer's bus for the duration of its run.
///
/// Takes the observer lock only inside `feed_chunk`; the bus fanout lock
/// is never held while feeding. Feed failures are stored on the observer
/// and never surface to the bus.
pub(crate) struct ObserverSink<C: Clock> {
    observer: Observer,
    clock: C,
    in_shutdown: Arc<AtomicBool>,
}

impl<C: Clock> BusSink for ObserverSink<C> {
    fn on_bytes(&self, chunk: &[u8]) -> Result<(), SinkError> {
        if self.observer.done() || self.in_shutdown.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.observer.feed_chunk(chunk, &self.clock);
        Ok(())
    }
}

/// One progress decision: exit conditions are done, deadline, shutdown.
pub(crate) enum Step {
    Exit,
    Tick,
}

pub(crate) fn step<C: Clock>(observer: &Observer, clock: &C, in_shutdown: bool) -> Step {
    if observer.done() {
        return Step::Exit;
    }
    if observer.expire_if_due(clock) {
        return Step::Exit;
    }
    if in_shutdown {
        observer.cancel();
        return Step::Exit;
    }
    Step::Tick
}

/// Admission decision made at the top of every `submit`.
pub(crate) fn admit(observer: &Observer, context: &Context, in_shutdown: bool) -> Result<(), CoreError> {
    if in_shutdown {
        return Err(CoreError::Other("runner is shut down".into()));
    }
    if let Some(refusal) = context.admission_refusal() {
        return Err(refusal);
    }
    if observer.started_at().is_none() {
        return Err(CoreError::wrong_usage("observer submitted before start()"));
    }
    Ok(())
}

/// Establish the data path: subscribe the sink, then write a command's
/// request line. Runs synchronously inside `submit`, so no inbound byte
/// between submit and the first tick can be lost.
pub(crate) fn install<C: Clock>(
    observer: &Observer,
    clock: C,
    in_shutdown: Arc<AtomicBool>,
) -> Arc<dyn BusSink> {
    let sink: Arc<dyn BusSink> = Arc::new(ObserverSink {
        observer: observer.clone(),
        clock,
        in_shutdown,
    });
    observer.bus().subscribe(&sink);
    tracing::debug!(observer = %observer.id(), bus = %observer.bus().name(), "subscribed");
    if let Some(request) = observer.request_line() {
        if let Err(error) = observer.bus().sendline(&request) {
            observer.set_exception(error);
        }
    }
    sink
}

/// Break the data path and reap the handle from the runner's live set.
pub(crate) fn teardown(observer: &Observer, sink: &Arc<dyn BusSink>, live: &Mutex<Vec<Handle>>) {
    observer.bus().unsubscribe(sink);
    live.lock().retain(|h| h.observer().id() != observer.id());
    tracing::debug!(observer = %observer.id(), "unsubscribed");
}

/// The cooperative progress task shared by both tokio backends.
pub(crate) async fn drive<C: Clock>(
    observer: Observer,
    sink: Arc<dyn BusSink>,
    clock: C,
    in_shutdown: Arc<AtomicBool>,
    live: Arc<Mutex<Vec<Handle>>>,
) {
    // give control back before processing so submit stays quick
    tokio::time::sleep(TICK).await;
    loop {
        match step(&observer, &clock, in_shutdown.load(Ordering::SeqCst)) {
            Step::Exit => break,
            Step::Tick => tokio::time::sleep(TICK).await,
        }
    }
    teardown(&observer, &sink, &live);
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
