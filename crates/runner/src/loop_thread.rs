// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dedicated-loop-thread backend.
//!
//! A cooperative scheduler runs on its own thread for the lifetime of
//! the runner; callers on any thread submit work through the scheduler
//! handle and join across threads. Submit waits (bounded) for the
//! progress task to report in, so a scheduler that cannot schedule is
//! detected at submit time instead of at the first lost wait.

use crate::context::Context;
use crate::progress::{self, SHUTDOWN_GRACE};
use lo_core::{Clock, CoreError, RunnerId, SystemClock};
use lo_observe::{Handle, Observer, Runner};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Bound on waiting for the loop thread and for each feed task to start.
const START_TIMEOUT: Duration = Duration::from_millis(500);

pub struct LoopRunner<C: Clock = SystemClock> {
    id: RunnerId,
    clock: C,
    context: Arc<Context>,
    in_shutdown: Arc<AtomicBool>,
    live: Arc<Mutex<Vec<Handle>>>,
    tracker: TaskTracker,
    scheduler: tokio::runtime::Handle,
    stop: CancellationToken,
    loop_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl LoopRunner<SystemClock> {
    pub fn new(context: Arc<Context>) -> Result<Arc<Self>, CoreError> {
        Self::with_clock(context, SystemClock)
    }
}

impl<C: Clock> LoopRunner<C> {
    pub fn with_clock(context: Arc<Context>, clock: C) -> Result<Arc<Self>, CoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| CoreError::Other(format!("failed to build scheduler: {error}")))?;
        let scheduler = runtime.handle().clone();
        let stop = CancellationToken::new();
        let stop_on_loop = stop.clone();
        let (started_tx, started_rx) = mpsc::channel();
        let id = context.allocate_runner_id();
        let loop_thread = thread::Builder::new()
            .name(format!("lookout-loop-{}", id.as_u64()))
            .spawn(move || {
                runtime.block_on(async {
                    let _ = started_tx.send(());
                    stop_on_loop.cancelled().await;
                });
                // runtime drops here, on the thread that owns it
            })
            .map_err(|error| CoreError::Other(format!("failed to spawn loop thread: {error}")))?;
        if started_rx.recv_timeout(START_TIMEOUT).is_err() {
            stop.cancel();
            return Err(CoreError::Other(format!(
                "failed to start loop thread within {START_TIMEOUT:?}"
            )));
        }
        tracing::debug!(runner = %id, "created loop-thread runner");
        Ok(Arc::new(Self {
            id,
            clock,
            context,
            in_shutdown: Arc::new(AtomicBool::new(false)),
            live: Arc::new(Mutex::new(Vec::new())),
            tracker: TaskTracker::new(),
            scheduler,
            stop,
            loop_thread: Mutex::new(Some(loop_thread)),
        }))
    }

    fn inside_scheduler() -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }
}

impl<C: Clock> Runner for LoopRunner<C> {
    fn id(&self) -> RunnerId {
        self.id
    }

    fn submit(&self, observer: &Observer) -> Handle {
        let handle = Handle::new(observer.clone(), observer.runner());
        if let Err(refusal) = progress::admit(observer, &self.context, self.in_shutdown()) {
            tracing::warn!(runner = %self.id, observer = %observer.id(), error = %refusal, "refusing submission");
            observer.set_exception(refusal);
            return handle;
        }

        // data path is built here, on the caller's thread, so nothing can
        // be lost while the feed task is still being scheduled
        let sink = progress::install(observer, self.clock.clone(), Arc::clone(&self.in_shutdown));
        self.live.lock().push(handle.clone());

        let (feeding_tx, feeding_rx) = mpsc::sync_channel::<()>(1);
        let task = {
            let observer = observer.clone();
            let sink = Arc::clone(&sink);
            let clock = self.clock.clone();
            let in_shutdown = Arc::clone(&self.in_shutdown);
            let live = Arc::clone(&self.live);
            async move {
                let _ = feeding_tx.send(());
                progress::drive(observer, sink, clock, in_shutdown, live).await;
            }
        };
        self.tracker.spawn_on(task, &self.scheduler);

        if feeding_rx.recv_timeout(START_TIMEOUT).is_err() {
            tracing::error!(runner = %self.id, observer = %observer.id(), "feed task failed to start");
            observer.bus().unsubscribe(&sink);
            self.live.lock().retain(|h| h.observer().id() != observer.id());
            observer.set_exception(CoreError::Other(format!(
                "failed to start observer feeder within {START_TIMEOUT:?}"
            )));
        }
        handle
    }

    fn wait(&self, handle: &Handle, timeout: Option<Duration>) -> Result<(), CoreError> {
        if Self::inside_scheduler() {
            return Err(CoreError::wrong_usage(
                "cannot block on wait() from inside a running scheduler; await handle.joined() instead",
            ));
        }
        let observer = handle.observer();
        tracing::debug!(runner = %self.id, observer = %observer.id(), "go foreground");
        if observer.done() {
            return Ok(());
        }
        let waited_from = self.clock.now();
        if !observer.wait_terminal(timeout) {
            let limit = timeout.unwrap_or(Duration::ZERO);
            let elapsed = self.clock.elapsed_since(waited_from);
            observer.set_exception(CoreError::await_timeout(limit, elapsed));
            handle.cancel();
        }
        Ok(())
    }

    fn shutdown(&self) {
        if self.in_shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(runner = %self.id, "shutting down");
        for handle in self.live.lock().drain(..) {
            handle.cancel();
        }
        self.tracker.close();
        if Self::inside_scheduler() {
            tracing::warn!(runner = %self.id, "shutdown from async context; loop thread left to stop");
            self.stop.cancel();
            return;
        }
        let drained = self
            .scheduler
            .block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, self.tracker.wait()).await });
        if drained.is_err() {
            tracing::warn!(runner = %self.id, "progress tasks still running after shutdown grace");
        }
        self.stop.cancel();
        if let Some(loop_thread) = self.loop_thread.lock().take() {
            let _ = loop_thread.join();
        }
    }

    fn in_shutdown(&self) -> bool {
        self.in_shutdown.load(Ordering::SeqCst)
    }
}

impl<C: Clock> Drop for LoopRunner<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "loop_thread_tests.rs"]
mod tests;
