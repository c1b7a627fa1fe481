//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};

use crate::pal::abstractions::Platform;

const ERR_POISONED_LOCK: &str = "FakePlatform state lock should not be poisoned";

#[derive(Debug, Default)]
struct FakePlatformState {
    cycles: u64,
    milliseconds: u64,

    // When set, every millisecond clock read advances the clock by one millisecond
    // and the cycle counter by `cycles_per_tick`, simulating a spinning processor.
    ticking: bool,
    cycles_per_tick: u64,
}

/// Fake implementation of the platform abstraction for testing.
///
/// Clones share the same clocks, so a test can keep one clone and advance time while the
/// profiler under test holds another.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    /// Creates a new fake platform with both clocks at zero.
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakePlatformState::default())),
        }
    }

    /// Sets the cycle counter to an absolute value.
    pub(crate) fn set_cycles(&self, cycles: u64) {
        self.state.lock().expect(ERR_POISONED_LOCK).cycles = cycles;
    }

    /// Advances the cycle counter, wrapping like the hardware counter does.
    pub(crate) fn advance_cycles(&self, cycles: u64) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.cycles = state.cycles.wrapping_add(cycles);
    }

    /// Makes every millisecond clock read advance the millisecond clock by one
    /// and the cycle counter by `cycles_per_millisecond`.
    pub(crate) fn tick_on_clock_read(&self, cycles_per_millisecond: u64) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.ticking = true;
        state.cycles_per_tick = cycles_per_millisecond;
    }
}

impl Platform for FakePlatform {
    fn cycles(&self) -> u64 {
        self.state.lock().expect(ERR_POISONED_LOCK).cycles
    }

    fn milliseconds(&self) -> u64 {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        let now = state.milliseconds;

        if state.ticking {
            state.milliseconds = state.milliseconds.wrapping_add(1);
            state.cycles = state.cycles.wrapping_add(state.cycles_per_tick);
        }

        now
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn initializes_with_zero_clocks() {
        let platform = FakePlatform::new();
        assert_eq!(platform.cycles(), 0);
        assert_eq!(platform.milliseconds(), 0);
    }

    #[test]
    fn advance_wraps_around() {
        let platform = FakePlatform::new();
        platform.set_cycles(u64::MAX);
        platform.advance_cycles(2);

        assert_eq!(platform.cycles(), 1);
    }

    #[test]
    fn clock_read_ticks_when_configured() {
        let platform = FakePlatform::new();
        platform.tick_on_clock_read(1000);

        assert_eq!(platform.milliseconds(), 0);
        assert_eq!(platform.milliseconds(), 1);
        assert_eq!(platform.cycles(), 2000);
    }

    #[test]
    fn clock_read_ticks_without_cycles() {
        let platform = FakePlatform::new();
        platform.tick_on_clock_read(0);

        platform.milliseconds();
        assert_eq!(platform.milliseconds(), 1);
        assert_eq!(platform.cycles(), 0);
    }

    #[test]
    fn clock_stands_still_by_default() {
        let platform = FakePlatform::new();

        platform.milliseconds();
        assert_eq!(platform.milliseconds(), 0);
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();

        platform1.advance_cycles(100);
        assert_eq!(platform2.cycles(), 100);
    }
}
