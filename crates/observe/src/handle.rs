// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The caller-visible side of a submitted observer.

use crate::observer::Observer;
use crate::runner::Runner;
use lo_core::CoreError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Awaitable/joinable wrapper returned from `submit`.
///
/// Thin by design: terminal state lives on the observer, and `join`
/// delegates to the runner so each backend keeps its own blocking rules.
#[derive(Clone)]
pub struct Handle {
    observer: Observer,
    runner: Arc<dyn Runner>,
}

impl Handle {
    pub fn new(observer: Observer, runner: Arc<dyn Runner>) -> Self {
        Self { observer, runner }
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Synchronous join with an optional caller-side bound.
    ///
    /// The bound limits only this wait; the observer's own deadline keeps
    /// governing its termination. When the bound fires first the runner
    /// fails the observer with an await-bound timeout before returning.
    pub fn join(&self, timeout: Option<Duration>) -> Result<(), CoreError> {
        self.runner.wait(self, timeout)
    }

    /// Best-effort cancellation; the observer's terminal state is the
    /// ground truth.
    pub fn cancel(&self) {
        self.observer.cancel();
    }

    pub fn done(&self) -> bool {
        self.observer.done()
    }

    /// Join without a bound, then return the observer's result or
    /// re-raise its stored failure.
    pub fn result(&self) -> Result<Value, CoreError> {
        self.join(None)?;
        self.observer.result()
    }

    /// Cooperative-await entry point; meaningful inside a runner that
    /// drives a scheduler. Yields until terminal, then resolves like
    /// [`Handle::result`].
    pub async fn joined(&self) -> Result<Value, CoreError> {
        self.observer.terminated().await;
        self.observer.result()
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("observer", &self.observer)
            .field("runner", &self.runner.id())
            .finish()
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
