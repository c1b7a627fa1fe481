//! Conversion of cycle counts to seconds.

use std::hint;
use std::time::Duration;

use crate::pal::Platform;

/// Length of the calibration window used when none is specified.
pub const DEFAULT_CALIBRATION_WINDOW: Duration = Duration::from_millis(100);

/// The result of measuring how many cycles elapse during a fixed wall-clock window.
///
/// # Examples
///
/// ```
/// use cycle_tree::Profiler;
/// use std::time::Duration;
///
/// let profiler = Profiler::new();
/// let calibration = profiler.calibrate(Duration::from_millis(10));
///
/// if let Some(cycles_per_second) = calibration.cycles_per_second() {
///     println!("The cycle counter ticks {cycles_per_second:.0} times per second");
/// }
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Calibration {
    window: Duration,
    window_cycles: u64,
}

impl Calibration {
    pub(crate) fn new(window: Duration, window_cycles: u64) -> Self {
        Self {
            window,
            window_cycles,
        }
    }

    /// The wall-clock window the measurement was taken over.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of cycles observed during the window.
    #[must_use]
    pub fn window_cycles(&self) -> u64 {
        self.window_cycles
    }

    /// Cycles per second of wall-clock time.
    ///
    /// `None` if no cycles were observed, in which case no conversion is possible.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "cycle counts beyond 2^52 lose precision we do not need for display"
    )]
    pub fn cycles_per_second(&self) -> Option<f64> {
        if self.window_cycles == 0 || self.window.is_zero() {
            return None;
        }

        Some(self.window_cycles as f64 / self.window.as_secs_f64())
    }

    /// Converts a cycle count to seconds of wall-clock time.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "cycle counts beyond 2^52 lose precision we do not need for display"
    )]
    pub fn seconds(&self, cycles: u64) -> Option<f64> {
        self.cycles_per_second()
            .map(|cycles_per_second| cycles as f64 / cycles_per_second)
    }
}

/// Spins until `window` has elapsed on the millisecond clock and records the cycle counter
/// delta over that span.
///
/// The clock only resolves whole milliseconds, so any fraction of a millisecond in `window` is
/// dropped and the returned calibration reports the window that was actually measured.
///
/// This intentionally burns processor time for the whole window and cannot be interrupted.
pub(crate) fn calibrate(platform: &impl Platform, window: Duration) -> Calibration {
    let window_millis = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);

    let start_millis = platform.milliseconds();
    let start_cycles = platform.cycles();

    while platform.milliseconds().wrapping_sub(start_millis) < window_millis {
        hint::spin_loop();
    }

    let window_cycles = platform.cycles().wrapping_sub(start_cycles);
    let calibration = Calibration::new(Duration::from_millis(window_millis), window_cycles);

    tracing::debug!(
        window_ms = window_millis,
        window_cycles,
        cycles_per_second = calibration.cycles_per_second(),
        "calibrated cycle counter"
    );

    calibration
}
