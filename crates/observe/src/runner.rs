// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execution-backend contract.
//!
//! Three backends implement this trait (worker threads, an inline
//! cooperative scheduler, a dedicated loop thread); observer semantics
//! are identical across them and the same behaviour tests run against
//! each.

use crate::handle::Handle;
use crate::observer::Observer;
use lo_core::{CoreError, RunnerId};
use std::time::Duration;

pub trait Runner: Send + Sync {
    fn id(&self) -> RunnerId;

    /// Schedule the observer's progress task. Non-blocking and
    /// infallible: on return the observer is subscribed to its bus (no
    /// inbound byte is lost between submit and the first tick) and a
    /// command's request line has been written. Refusals come back as a
    /// pre-failed handle, never as an error.
    fn submit(&self, observer: &Observer) -> Handle;

    /// Block until the observer is terminal or `timeout` elapses. On
    /// timeout the observer is failed with an await-bound `Timeout` and
    /// the handle cancelled.
    ///
    /// Fails with `WrongUsage` when called from inside a cooperative
    /// runner context; blocking there would deadlock the scheduler.
    fn wait(&self, handle: &Handle, timeout: Option<Duration>) -> Result<(), CoreError>;

    /// Latch shutdown and reclaim every progress task: each live
    /// observer reaches a terminal state and its sink is unsubscribed.
    /// Idempotent.
    fn shutdown(&self);

    /// True once shutdown has been requested; never cleared.
    fn in_shutdown(&self) -> bool;
}
