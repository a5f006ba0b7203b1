// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inline-cooperative backend.
//!
//! One cooperative scheduler lives in the caller's thread; progress
//! tasks share it and only advance while `wait` drives it. A blocking
//! `wait` from inside a running scheduler would deadlock the loop on
//! itself, so it is refused with `WrongUsage`.

use crate::context::Context;
use crate::progress::{self, SHUTDOWN_GRACE};
use lo_core::{Clock, CoreError, RunnerId, SystemClock};
use lo_observe::{Handle, Observer, Runner};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

pub struct InlineRunner<C: Clock = SystemClock> {
    id: RunnerId,
    clock: C,
    context: Arc<Context>,
    in_shutdown: Arc<AtomicBool>,
    live: Arc<Mutex<Vec<Handle>>>,
    scheduler: tokio::runtime::Runtime,
    tracker: TaskTracker,
    tasks: Mutex<HashMap<u64, tokio::task::JoinHandle<()>>>,
}

impl InlineRunner<SystemClock> {
    pub fn new(context: Arc<Context>) -> Result<Arc<Self>, CoreError> {
        Self::with_clock(context, SystemClock)
    }
}

impl<C: Clock> InlineRunner<C> {
    pub fn with_clock(context: Arc<Context>, clock: C) -> Result<Arc<Self>, CoreError> {
        let scheduler = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| CoreError::Other(format!("failed to build scheduler: {error}")))?;
        let id = context.allocate_runner_id();
        tracing::debug!(runner = %id, "created inline runner");
        Ok(Arc::new(Self {
            id,
            clock,
            context,
            in_shutdown: Arc::new(AtomicBool::new(false)),
            live: Arc::new(Mutex::new(Vec::new())),
            scheduler,
            tracker: TaskTracker::new(),
            tasks: Mutex::new(HashMap::new()),
        }))
    }

    fn inside_scheduler() -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }

    /// Drive the observer's progress task to completion so its sink is
    /// unsubscribed before wait returns.
    fn reap(&self, observer: &Observer) {
        let task = self.tasks.lock().remove(&observer.id().as_u64());
        if let Some(task) = task {
            let _ = self
                .scheduler
                .block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, task).await });
        }
    }
}

impl<C: Clock> Runner for InlineRunner<C> {
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
        let task = self.tracker.spawn_on(
            progress::drive(
                observer.clone(),
                sink,
                self.clock.clone(),
                Arc::clone(&self.in_shutdown),
                Arc::clone(&self.live),
            ),
            self.scheduler.handle(),
        );
        self.tasks.lock().insert(observer.id().as_u64(), task);
        handle
    }

    fn wait(&self, handle: &Handle, timeout: Option<Duration>) -> Result<(), CoreError> {
        if Self::inside_scheduler() {
            return Err(CoreError::wrong_usage(
                "cannot block on wait() from inside a running scheduler; await handle.joined() instead",
            ));
        }
        let observer = handle.observer().clone();
        tracing::debug!(runner = %self.id, observer = %observer.id(), "go foreground");
        if !observer.done() {
            let waited_from = self.clock.now();
            let finished = self.scheduler.block_on(async {
                match timeout {
                    Some(bound) => tokio::time::timeout(bound, observer.terminated()).await.is_ok(),
                    None => {
                        observer.terminated().await;
                        true
                    }
                }
            });
            if !finished {
                let limit = timeout.unwrap_or(Duration::ZERO);
                let elapsed = self.clock.elapsed_since(waited_from);
                observer.set_exception(CoreError::await_timeout(limit, elapsed));
                handle.cancel();
            }
        }
        self.reap(&observer);
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
        self.tasks.lock().clear();
        self.tracker.close();
        if Self::inside_scheduler() {
            // cannot drive our scheduler from inside another one; tasks
            // drain on the next wait()
            tracing::warn!(runner = %self.id, "shutdown from async context; skipping drain");
            return;
        }
        let drained = self
            .scheduler
            .block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, self.tracker.wait()).await });
        if drained.is_err() {
            tracing::warn!(runner = %self.id, "progress tasks still running after shutdown grace");
        }
    }

    fn in_shutdown(&self) -> bool {
        self.in_shutdown.load(Ordering::SeqCst)
    }
}

impl<C: Clock> Drop for InlineRunner<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "inline_tests.rs"]
mod tests;
