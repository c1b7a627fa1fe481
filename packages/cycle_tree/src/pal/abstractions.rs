//! Platform abstraction trait definitions.

use std::fmt::Debug;

/// Provides the two clock primitives the profiler is built on.
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Reads the free-running hardware cycle counter.
    ///
    /// The value is monotonic within a thread of execution and wraps at `u64` overflow.
    fn cycles(&self) -> u64;

    /// Reads a monotonic wall clock, in milliseconds since an arbitrary epoch.
    fn milliseconds(&self) -> u64;
}
