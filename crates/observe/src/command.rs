// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands: observers that open the dialogue.
//!
//! A command writes its request line (plus newline) to the bus at submit
//! time, after subscription and before the first tick, then watches the
//! reply like any other observer.

use crate::feeders::{Reply, SharedOutput};
use crate::handle::Handle;
use crate::observer::Observer;
use crate::runner::Runner;
use lo_bus::ByteBus;
use lo_core::CoreError;
use std::sync::Arc;
use std::time::Duration;

/// Command deadline when none is configured; generous because attach-like
/// dialogues can take minutes. Readable and extensible while running.
pub const DEFAULT_COMMAND_DEADLINE: Duration = Duration::from_secs(180);

/// A request/response round-trip as a single awaitable.
pub struct Command {
    observer: Observer,
    output: SharedOutput,
}

impl Command {
    pub fn builder(
        bus: Arc<ByteBus>,
        runner: Arc<dyn Runner>,
        request: impl Into<String>,
    ) -> CommandBuilder {
        CommandBuilder {
            bus,
            runner,
            request: request.into(),
            ok_terminator: "\n".into(),
            error_marker: None,
            requires_result: true,
            deadline: DEFAULT_COMMAND_DEADLINE,
        }
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Start the round-trip; the request line goes out during submit.
    pub fn start(&self) -> Result<Handle, CoreError> {
        self.observer.start()
    }

    /// Reply output observed so far.
    pub fn output(&self) -> String {
        self.output.snapshot()
    }
}

/// Builder keeping command construction readable at call sites.
pub struct CommandBuilder {
    bus: Arc<ByteBus>,
    runner: Arc<dyn Runner>,
    request: String,
    ok_terminator: String,
    error_marker: Option<String>,
    requires_result: bool,
    deadline: Duration,
}

impl CommandBuilder {
    /// Reply text that completes the command.
    pub fn complete_on(mut self, terminator: impl Into<String>) -> Self {
        self.ok_terminator = terminator.into();
        self
    }

    /// Reply text that fails the command with `CommandFailure`.
    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.error_marker = Some(marker.into());
        self
    }

    /// When false, an empty object is an acceptable success value.
    pub fn requires_result(mut self, requires: bool) -> Self {
        self.requires_result = requires;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn build(self) -> Command {
        let reply = Reply::new(
            self.request.clone(),
            self.ok_terminator,
            self.error_marker,
            self.requires_result,
        );
        let output = reply.output();
        let observer = Observer::new(self.request.clone(), self.bus, self.runner, Box::new(reply))
            .with_deadline(self.deadline)
            .with_request(self.request.into_bytes());
        Command { observer, output }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
