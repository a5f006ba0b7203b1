// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-thread backend.
//!
//! Each observer's progress task runs on its own OS thread; bus fanout
//! stays on the transport's reader thread. `wait` is a blocking join on
//! the observer's condvar.

use crate::context::Context;
use crate::progress::{self, Step, TICK};
use lo_core::{Clock, CoreError, RunnerId, SystemClock};
use lo_observe::{Handle, Observer, Runner};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct ThreadRunner<C: Clock = SystemClock> {
    id: RunnerId,
    clock: C,
    context: Arc<Context>,
    in_shutdown: Arc<AtomicBool>,
    live: Arc<Mutex<Vec<Handle>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl ThreadRunner<SystemClock> {
    pub fn new(context: Arc<Context>) -> Arc<Self> {
        Self::with_clock(context, SystemClock)
    }
}

impl<C: Clock> ThreadRunner<C> {
    pub fn with_clock(context: Arc<Context>, clock: C) -> Arc<Self> {
        let id = context.allocate_runner_id();
        tracing::debug!(runner = %id, "created thread runner");
        Arc::new(Self {
            id,
            clock,
            context,
            in_shutdown: Arc::new(AtomicBool::new(false)),
            live: Arc::new(Mutex::new(Vec::new())),
            workers: Mutex::new(Vec::new()),
        })
    }
}

impl<C: Clock> Runner for ThreadRunner<C> {
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

        let sink = progress::install(observer, self.clock.clone(), Arc::clone(&self.in_shutdown));
        self.live.lock().push(handle.clone());

        let worker = {
            let observer = observer.clone();
            let sink = Arc::clone(&sink);
            let clock = self.clock.clone();
            let in_shutdown = Arc::clone(&self.in_shutdown);
            let live = Arc::clone(&self.live);
            thread::Builder::new()
                .name(format!("lookout-{}", observer.id()))
                .spawn(move || {
                    loop {
                        match progress::step(&observer, &clock, in_shutdown.load(Ordering::SeqCst)) {
                            Step::Exit => break,
                            Step::Tick => thread::sleep(TICK),
                        }
                    }
                    progress::teardown(&observer, &sink, &live);
                })
        };
        match worker {
            Ok(joiner) => self.workers.lock().push(joiner),
            Err(error) => {
                // no thread, no progress task: fail and tear down now
                observer.bus().unsubscribe(&sink);
                self.live.lock().retain(|h| h.observer().id() != observer.id());
                observer.set_exception(CoreError::Other(format!(
                    "failed to spawn progress thread: {error}"
                )));
            }
        }
        handle
    }

    fn wait(&self, handle: &Handle, timeout: Option<Duration>) -> Result<(), CoreError> {
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
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for worker in workers {
            let _ = worker.join();
        }
    }

    fn in_shutdown(&self) -> bool {
        self.in_shutdown.load(Ordering::SeqCst)
    }
}

impl<C: Clock> Drop for ThreadRunner<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "threaded_tests.rs"]
mod tests;
