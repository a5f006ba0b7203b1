// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-unique identifiers for runners and observers.
//!
//! Ids are sequential, allocated from counters owned by the runtime
//! context, so creation order is visible in logs and tests never collide.

macro_rules! define_seq_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(n: u64) -> Self {
                Self(n)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

define_seq_id! {
    /// Identifies one runner instance within the process.
    RunnerId, "runner"
}

define_seq_id! {
    /// Identifies one observer within the process.
    ObserverId, "observer"
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
