//! Real platform implementation reading the processor's own counters.

use std::sync::OnceLock;
use std::time::Instant;

use crate::pal::abstractions::Platform;

/// Real implementation of the platform abstraction.
///
/// On `x86_64` the cycle counter is the time stamp counter. On `aarch64` it is the virtual
/// timer count, which ticks at a fixed frequency rather than with the core clock. Other
/// architectures fall back to monotonic nanoseconds, which the calibration pass converts
/// back into seconds just the same.
#[derive(Debug, Clone)]
pub(crate) struct RealPlatform;

/// Epoch for the millisecond clock and the fallback cycle counter.
fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();

    *EPOCH.get_or_init(Instant::now)
}

impl Platform for RealPlatform {
    #[cfg(target_arch = "x86_64")]
    #[inline]
    fn cycles(&self) -> u64 {
        // SAFETY: RDTSC is available on every x86_64 processor and has no preconditions.
        unsafe { core::arch::x86_64::_rdtsc() }
    }

    #[cfg(target_arch = "aarch64")]
    #[inline]
    fn cycles(&self) -> u64 {
        let value: u64;

        // SAFETY: CNTVCT_EL0 is readable from user mode on every aarch64 operating system
        // we support and reading it has no side effects.
        unsafe {
            core::arch::asm!("mrs {}, cntvct_el0", out(reg) value, options(nomem, nostack));
        }

        value
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[inline]
    fn cycles(&self) -> u64 {
        // Saturates after ~584 years of uptime.
        u64::try_from(epoch().elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn milliseconds(&self) -> u64 {
        u64::try_from(epoch().elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
#[cfg(not(miri))] // Miri cannot talk to the real platform.
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn milliseconds_advance_with_wall_clock() {
        let platform = RealPlatform;

        let before = platform.milliseconds();
        thread::sleep(Duration::from_millis(20));
        let after = platform.milliseconds();

        assert!(after >= before.saturating_add(20), "{before} -> {after}");
    }

    #[test]
    fn cycles_advance_while_time_passes() {
        let platform = RealPlatform;

        let before = platform.cycles();
        thread::sleep(Duration::from_millis(5));
        let after = platform.cycles();

        assert_ne!(before, after);
    }
}
