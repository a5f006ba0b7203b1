// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The observer lifecycle state machine.
//!
//! ```text
//! unstarted --start--> running --feed sets result--> succeeded (terminal)
//!                        |   --feed fails-----------> failed    (terminal)
//!                        |   --deadline elapsed-----> failed    (Timeout)
//!                        |   --cancel--------------->+cancelled (terminal)
//!                        +---runner shutdown-------->+cancelled (terminal)
//! ```
//!
//! Terminal states are sticky: the first mutation under the observer lock
//! wins and later attempts are ignored. `feed` runs under the same lock,
//! so it is never entered concurrently with itself or with a state
//! mutation on the same observer.

use crate::feed::{Feed, Feeder};
use crate::handle::Handle;
use crate::runner::Runner;
use lo_bus::ByteBus;
use lo_core::{Clock, CoreError, ObserverId};
use parking_lot::{Condvar, Mutex, MutexGuard};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Observer deadline when none is configured.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(7);

// Observer identity is allocation order, process-wide.
static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Caller-visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unstarted,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Succeeded | State::Failed | State::Cancelled)
    }
}

enum Lifecycle {
    Unstarted,
    Running { started_at: Instant },
    Succeeded(Value),
    Failed(CoreError),
    Cancelled,
}

impl Lifecycle {
    fn is_terminal(&self) -> bool {
        matches!(self, Lifecycle::Succeeded(_) | Lifecycle::Failed(_) | Lifecycle::Cancelled)
    }
}

struct Inner {
    lifecycle: Lifecycle,
    deadline: Duration,
    feeder: Option<Box<dyn Feeder>>,
    request: Option<Vec<u8>>,
}

struct ObserverCore {
    id: ObserverId,
    name: String,
    bus: Arc<ByteBus>,
    runner: Arc<dyn Runner>,
    inner: Mutex<Inner>,
    terminal: Condvar,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

/// A passive watcher of one bus, driven to a terminal state by a runner.
///
/// Cheap to clone; clones share lifecycle state.
#[derive(Clone)]
pub struct Observer {
    core: Arc<ObserverCore>,
}

impl Observer {
    pub fn new(
        name: impl Into<String>,
        bus: Arc<ByteBus>,
        runner: Arc<dyn Runner>,
        feeder: Box<dyn Feeder>,
    ) -> Self {
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            core: Arc::new(ObserverCore {
                id: ObserverId::new(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed)),
                name: name.into(),
                bus,
                runner,
                inner: Mutex::new(Inner {
                    lifecycle: Lifecycle::Unstarted,
                    deadline: DEFAULT_DEADLINE,
                    feeder: Some(feeder),
                    request: None,
                }),
                terminal: Condvar::new(),
                done_tx,
                done_rx,
            }),
        }
    }

    pub fn with_deadline(self, deadline: Duration) -> Self {
        self.core.inner.lock().deadline = deadline;
        self
    }

    /// Request line written to the bus at submit; what makes this
    /// observer a command.
    pub fn with_request(self, request: impl Into<Vec<u8>>) -> Self {
        self.core.inner.lock().request = Some(request.into());
        self
    }

    pub fn id(&self) -> ObserverId {
        self.core.id
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn bus(&self) -> &Arc<ByteBus> {
        &self.core.bus
    }

    /// Relative deadline, re-read by runners on every tick; may be
    /// mutated while the observer runs.
    pub fn deadline(&self) -> Duration {
        self.core.inner.lock().deadline
    }

    pub fn set_deadline(&self, deadline: Duration) {
        self.core.inner.lock().deadline = deadline;
    }

    pub fn started_at(&self) -> Option<Instant> {
        match self.core.inner.lock().lifecycle {
            Lifecycle::Running { started_at } => Some(started_at),
            _ => None,
        }
    }

    pub fn request_line(&self) -> Option<Vec<u8>> {
        self.core.inner.lock().request.clone()
    }

    pub fn state(&self) -> State {
        match self.core.inner.lock().lifecycle {
            Lifecycle::Unstarted => State::Unstarted,
            Lifecycle::Running { .. } => State::Running,
            Lifecycle::Succeeded(_) => State::Succeeded,
            Lifecycle::Failed(_) => State::Failed,
            Lifecycle::Cancelled => State::Cancelled,
        }
    }

    pub fn done(&self) -> bool {
        self.core.inner.lock().lifecycle.is_terminal()
    }

    /// Transition unstarted -> running and hand this observer to its
    /// runner. Fails with `WrongUsage` on a second call.
    pub fn start(&self) -> Result<Handle, CoreError> {
        {
            let mut inner = self.core.inner.lock();
            match inner.lifecycle {
                Lifecycle::Unstarted => {
                    inner.lifecycle = Lifecycle::Running { started_at: Instant::now() };
                }
                _ => {
                    return Err(CoreError::wrong_usage(format!(
                        "observer {} started twice",
                        self.core.name
                    )));
                }
            }
        }
        tracing::debug!(observer = %self.core.id, name = %self.core.name, "go background");
        Ok(self.core.runner.submit(self))
    }

    pub fn runner(&self) -> Arc<dyn Runner> {
        Arc::clone(&self.core.runner)
    }

    /// Terminal success; ignored when already terminal.
    pub fn set_result(&self, value: Value) {
        let mut inner = self.core.inner.lock();
        if inner.lifecycle.is_terminal() {
            return;
        }
        self.finish(&mut inner, Lifecycle::Succeeded(value));
    }

    /// Terminal failure; ignored when already terminal.
    pub fn set_exception(&self, error: CoreError) {
        let mut inner = self.core.inner.lock();
        if inner.lifecycle.is_terminal() {
            return;
        }
        self.finish(&mut inner, Lifecycle::Failed(error));
    }

    /// Terminal cancellation; no-op when already terminal.
    pub fn cancel(&self) {
        let mut inner = self.core.inner.lock();
        if inner.lifecycle.is_terminal() {
            return;
        }
        self.finish(&mut inner, Lifecycle::Cancelled);
    }

    /// Terminal result or stored failure.
    ///
    /// Non-blocking: callers that need to wait go through their handle.
    pub fn result(&self) -> Result<Value, CoreError> {
        match &self.core.inner.lock().lifecycle {
            Lifecycle::Succeeded(value) => Ok(value.clone()),
            Lifecycle::Failed(error) => Err(error.clone()),
            Lifecycle::Cancelled => Err(CoreError::Cancelled),
            _ => Err(CoreError::wrong_usage(format!(
                "result() called before observer {} is done",
                self.core.name
            ))),
        }
    }

    /// Deliver one bus chunk to the feeder under the observer lock.
    ///
    /// The deadline is checked against the live value both before the
    /// feeder runs and at feed-return, so an in-flight chunk never
    /// observes a stale deadline.
    pub fn feed_chunk<C: Clock>(&self, chunk: &[u8], clock: &C) {
        let mut inner = self.core.inner.lock();
        let started_at = match inner.lifecycle {
            Lifecycle::Running { started_at } => started_at,
            _ => return,
        };
        if self.expire_locked(&mut inner, started_at, clock) {
            return;
        }
        let feed = match inner.feeder.as_mut() {
            Some(feeder) => feeder.feed(chunk),
            None => Feed::Pending,
        };
        match feed {
            Feed::Pending => {
                self.expire_locked(&mut inner, started_at, clock);
            }
            Feed::Done(value) => self.finish(&mut inner, Lifecycle::Succeeded(value)),
            Feed::Failed(error) => self.finish(&mut inner, Lifecycle::Failed(error)),
        }
    }

    /// Fire the deadline if it is due. Returns true when the observer is
    /// terminal afterwards.
    pub fn expire_if_due<C: Clock>(&self, clock: &C) -> bool {
        let mut inner = self.core.inner.lock();
        if let Lifecycle::Running { started_at } = inner.lifecycle {
            self.expire_locked(&mut inner, started_at, clock);
        }
        inner.lifecycle.is_terminal()
    }

    fn expire_locked<C: Clock>(
        &self,
        inner: &mut MutexGuard<'_, Inner>,
        started_at: Instant,
        clock: &C,
    ) -> bool {
        let elapsed = clock.elapsed_since(started_at);
        let deadline = inner.deadline;
        if elapsed >= deadline {
            self.finish(inner, Lifecycle::Failed(CoreError::deadline_timeout(deadline, elapsed)));
            return true;
        }
        false
    }

    fn finish(&self, inner: &mut MutexGuard<'_, Inner>, to: Lifecycle) {
        match &to {
            Lifecycle::Succeeded(_) => {
                tracing::debug!(observer = %self.core.id, name = %self.core.name, "succeeded");
            }
            Lifecycle::Failed(error) => {
                tracing::debug!(observer = %self.core.id, name = %self.core.name, error = %error, "failed");
            }
            Lifecycle::Cancelled => {
                tracing::debug!(observer = %self.core.id, name = %self.core.name, "cancelled");
            }
            _ => {}
        }
        inner.lifecycle = to;
        self.core.terminal.notify_all();
        let _ = self.core.done_tx.send_replace(true);
    }

    /// Block the calling thread until terminal, or until `timeout`.
    /// Returns true when the observer reached a terminal state.
    pub fn wait_terminal(&self, timeout: Option<Duration>) -> bool {
        let mut inner = self.core.inner.lock();
        match timeout {
            Some(timeout) => {
                let _ = self.core.terminal.wait_while_for(
                    &mut inner,
                    |inner| !inner.lifecycle.is_terminal(),
                    timeout,
                );
                inner.lifecycle.is_terminal()
            }
            None => {
                self.core
                    .terminal
                    .wait_while(&mut inner, |inner| !inner.lifecycle.is_terminal());
                true
            }
        }
    }

    /// Resolve once the observer is terminal; the cooperative twin of
    /// [`Observer::wait_terminal`].
    pub async fn terminated(&self) {
        let mut rx = self.core.done_rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.core.id)
            .field("name", &self.core.name)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
