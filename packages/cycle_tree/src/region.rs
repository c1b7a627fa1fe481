//! Region identities and the per-region record kept by the registry.

use std::fmt;

/// Identifies one registered region of a [`Profiler`](crate::Profiler).
///
/// Identities are issued in order of registration and stay valid for the lifetime of the
/// profiler, including across [`Profiler::reset()`](crate::Profiler::reset). An identity is
/// only meaningful to the profiler that issued it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RegionId(usize);

impl RegionId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Stands in for every region when instrumentation is compiled out.
    #[cfg(feature = "disabled")]
    #[doc(hidden)]
    #[must_use]
    pub const fn disabled() -> Self {
        Self(usize::MAX)
    }

    /// Position of the region in registration order, starting from zero.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Accumulated data of one region.
#[derive(Debug)]
pub(crate) struct Region {
    pub(crate) name: String,
    pub(crate) total_cycles: u64,

    // Fixed by the first start after registration or reset.
    pub(crate) parent: Option<RegionId>,

    // Whether the region has been started since registration or the last reset.
    // Only entered regions appear in reports.
    pub(crate) entered: bool,
}

impl Region {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            total_cycles: 0,
            parent: None,
            entered: false,
        }
    }

    /// Returns the region to its state immediately after registration.
    pub(crate) fn clear(&mut self) {
        self.total_cycles = 0;
        self.parent = None;
        self.entered = false;
    }
}
