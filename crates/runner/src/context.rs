// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit runtime context: id allocation and the admission probe.
//!
//! Every runner is constructed over a shared `Context`; there is no
//! process-global registry, so tests instantiate and tear down their own.

use lo_core::{CoreError, RunnerId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Descriptors left before the soft limit at which admission stops.
pub const FD_GUARD_BAND: u64 = 10;

/// Snapshot of the process descriptor budget.
#[derive(Debug, Clone, Copy)]
pub struct FdUsage {
    pub open: u64,
    pub soft_limit: u64,
}

/// Source of the descriptor snapshot consulted before admitting an
/// observer.
pub trait ResourceProbe: Send + Sync {
    fn descriptors(&self) -> FdUsage;
}

/// Probe reading the real process limits.
///
/// Open descriptors are counted via procfs; on platforms without it the
/// count reads as zero and the guard never refuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl ResourceProbe for SystemProbe {
    fn descriptors(&self) -> FdUsage {
        let soft_limit = nix::sys::resource::getrlimit(nix::sys::resource::Resource::RLIMIT_NOFILE)
            .map(|(soft, _hard)| soft)
            .unwrap_or(u64::MAX);
        let open = std::fs::read_dir("/proc/self/fd")
            .map(|entries| entries.count() as u64)
            .unwrap_or(0);
        FdUsage { open, soft_limit }
    }
}

/// Controllable probe for tests.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeProbe {
    open: AtomicU64,
    soft_limit: u64,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeProbe {
    pub fn new(open: u64, soft_limit: u64) -> Self {
        Self { open: AtomicU64::new(open), soft_limit }
    }

    pub fn set_open(&self, open: u64) {
        self.open.store(open, Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ResourceProbe for FakeProbe {
    fn descriptors(&self) -> FdUsage {
        FdUsage { open: self.open.load(Ordering::SeqCst), soft_limit: self.soft_limit }
    }
}

/// Shared state runners are constructed over.
pub struct Context {
    probe: Arc<dyn ResourceProbe>,
    next_runner_id: AtomicU64,
}

impl Context {
    pub fn new() -> Arc<Self> {
        Self::with_probe(Arc::new(SystemProbe))
    }

    pub fn with_probe(probe: Arc<dyn ResourceProbe>) -> Arc<Self> {
        Arc::new(Self { probe, next_runner_id: AtomicU64::new(1) })
    }

    pub fn allocate_runner_id(&self) -> RunnerId {
        RunnerId::new(self.next_runner_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Why a new observer must be refused right now, if at all.
    ///
    /// Within [`FD_GUARD_BAND`] descriptors of the soft limit the runner
    /// answers submissions with a pre-failed handle instead of opening
    /// more resources.
    pub fn admission_refusal(&self) -> Option<CoreError> {
        let usage = self.probe.descriptors();
        if usage.open > usage.soft_limit.saturating_sub(FD_GUARD_BAND) {
            return Some(CoreError::ResourceLimit {
                open: usage.open,
                limit: usage.soft_limit,
            });
        }
        None
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
