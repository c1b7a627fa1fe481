//! The profiler instance: region registry, nesting tracker and calibration in one place.

use std::cell::RefCell;
use std::time::Duration;

use crate::calibration::calibrate;
use crate::error::Result;
use crate::pal::{Platform, PlatformFacade};
use crate::{Calibration, Error, OverlongNames, RegionId, Registry, Report, Span};

/// Maximum number of regions a profiler holds unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 256;

/// Maximum stored length of a region name, in characters, unless configured otherwise.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 255;

/// Set by the `disabled` feature, which turns starting, stopping and calibrating into no-ops.
const INSTRUMENTATION_DISABLED: bool = cfg!(feature = "disabled");

/// Accumulates processor cycles spent in named regions of code and reconstructs how the
/// regions nest inside each other.
///
/// Regions are registered once, typically per call site, and then started and stopped
/// around the code of interest. Starts and stops must be properly nested: every region
/// must be stopped before the region it was started inside of. The parent of a region is
/// whichever region was innermost when it was first started after registration or the
/// last [`reset()`](Self::reset), and it does not change afterwards.
///
/// A profiler is meant for use by a single thread. It can be moved to another thread but
/// not shared between threads. For a ready-made per-thread instance, see the free functions
/// at the crate root.
///
/// With the `disabled` feature, [`start()`](Self::start), [`stop()`](Self::stop) and
/// [`calibrate()`](Self::calibrate) do nothing, so instrumentation can stay in the code at
/// no measurable cost. Reports are then always empty.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cycle_tree::Profiler;
///
/// # fn main() -> Result<(), cycle_tree::Error> {
/// let profiler = Profiler::new();
/// profiler.initialize(Duration::from_millis(10));
///
/// let frame = profiler.register("frame")?;
/// let physics = profiler.register("physics")?;
///
/// for _ in 0..3 {
///     let _frame = profiler.enter(frame)?;
///     let _physics = profiler.enter(physics)?;
///     std::hint::black_box(42 * 2);
/// }
///
/// print!("{}", profiler.render_report());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Profiler {
    state: RefCell<ProfilerState>,
    platform: PlatformFacade,
}

#[derive(Debug)]
struct ProfilerState {
    registry: Registry,

    // Innermost region last.
    open: Vec<OpenRegion>,

    calibration: Option<Calibration>,
}

#[derive(Debug)]
struct OpenRegion {
    id: RegionId,
    started_at: u64,
}

impl Profiler {
    /// Creates a profiler with the default configuration.
    ///
    /// The profiler is not calibrated. Call [`initialize()`](Self::initialize) before
    /// relying on the seconds column of reports.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a new profiler.
    ///
    /// # Examples
    ///
    /// ```
    /// use cycle_tree::{OverlongNames, Profiler};
    ///
    /// let profiler = Profiler::builder()
    ///     .capacity(16)
    ///     .max_name_length(32)
    ///     .overlong_names(OverlongNames::Reject)
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder() -> ProfilerBuilder {
        ProfilerBuilder::new()
    }

    /// Clears all collected data, then calibrates the cycle counter over `window`.
    ///
    /// This blocks the calling thread for the duration of the window.
    ///
    /// # Panics
    ///
    /// Panics if `window` is shorter than one millisecond.
    pub fn initialize(&self, window: Duration) -> Calibration {
        self.reset();
        self.calibrate(window)
    }

    /// Measures the cycle counter frequency by spinning for `window`, replacing any previous
    /// calibration. Collected region data is not touched.
    ///
    /// The clock resolves whole milliseconds, so a fractional part of `window` is not measured.
    ///
    /// # Panics
    ///
    /// Panics if `window` is shorter than one millisecond.
    pub fn calibrate(&self, window: Duration) -> Calibration {
        assert!(
            window >= Duration::from_millis(1),
            "calibration window must be at least one millisecond"
        );

        let calibration = if INSTRUMENTATION_DISABLED {
            Calibration::new(window, 0)
        } else {
            calibrate(&self.platform, window)
        };
        self.state.borrow_mut().calibration = Some(calibration);
        calibration
    }

    /// The most recent calibration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CalibrationUnset`] if the profiler has never been calibrated or the
    /// calibration observed no cycles.
    pub fn calibration(&self) -> Result<Calibration> {
        self.state
            .borrow()
            .calibration
            .filter(|calibration| calibration.cycles_per_second().is_some())
            .ok_or(Error::CalibrationUnset)
    }

    /// Clears the accumulated cycles and parent links of every region and forgets any open
    /// regions.
    ///
    /// Region identities stay valid and keep their names. A region reappears in reports once
    /// it is started again, with its parent determined anew by that start.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();

        tracing::debug!(
            regions = state.registry.len(),
            discarded_open = state.open.len(),
            "profiler reset"
        );

        state.registry.reset();
        state.open.clear();
    }

    /// Registers a new region and returns its identity.
    ///
    /// Every call creates a distinct region, even if the name was used before, so two call
    /// sites that happen to share a name are still tracked separately. Register once per
    /// call site and keep the identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if every region slot is in use, or
    /// [`Error::NameTooLong`] if the name is too long and the profiler is configured to
    /// reject such names.
    pub fn register(&self, name: &str) -> Result<RegionId> {
        self.state.borrow_mut().registry.register(name)
    }

    /// Returns the identity of the first region registered under `name`, registering a new
    /// region if there is none yet.
    ///
    /// # Errors
    ///
    /// Same as [`register()`](Self::register).
    pub fn region(&self, name: &str) -> Result<RegionId> {
        self.state.borrow_mut().registry.find_or_register(name)
    }

    /// Opens a region, making it the parent of regions started before it is stopped.
    ///
    /// Prefer [`enter()`](Self::enter), which guarantees the region is stopped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRegion`] if the identity was not issued by this profiler.
    pub fn start(&self, id: RegionId) -> Result<()> {
        if INSTRUMENTATION_DISABLED {
            return Ok(());
        }

        let mut state = self.state.borrow_mut();
        let ProfilerState { registry, open, .. } = &mut *state;

        let region = registry.get_mut(id)?;

        if !region.entered {
            region.parent = open.last().map(|innermost| innermost.id);
            region.entered = true;
        }

        open.push(OpenRegion {
            id,
            // Read last so that bookkeeping is not attributed to the region.
            started_at: self.platform.cycles(),
        });

        Ok(())
    }

    /// Closes the innermost open region, which must be `id`, and adds the cycles elapsed since
    /// the matching start to its total. Returns the elapsed cycles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfOrderStop`] if another region opened inside `id` is still open,
    /// [`Error::NotOpen`] if `id` is not open at all, or [`Error::UnknownRegion`] if the
    /// identity was not issued by this profiler. Nothing is recorded on error.
    pub fn stop(&self, id: RegionId) -> Result<u64> {
        if INSTRUMENTATION_DISABLED {
            return Ok(0);
        }

        // Read first so that bookkeeping is not attributed to the region.
        let now = self.platform.cycles();

        let mut state = self.state.borrow_mut();
        let ProfilerState { registry, open, .. } = &mut *state;

        let name = &registry.get(id)?.name;

        let Some(innermost) = open.last() else {
            return Err(Error::NotOpen { name: name.clone() });
        };

        if innermost.id != id {
            if open.iter().any(|open_region| open_region.id == id) {
                return Err(Error::OutOfOrderStop {
                    name: name.clone(),
                    innermost: registry.get(innermost.id)?.name.clone(),
                });
            }

            return Err(Error::NotOpen { name: name.clone() });
        }

        let started_at = innermost.started_at;
        open.pop();

        let elapsed = now.wrapping_sub(started_at);
        registry.accumulate(id, elapsed)?;

        Ok(elapsed)
    }

    /// Starts a region and returns a guard that stops it when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRegion`] if the identity was not issued by this profiler.
    ///
    /// # Examples
    ///
    /// ```
    /// use cycle_tree::Profiler;
    ///
    /// # fn main() -> Result<(), cycle_tree::Error> {
    /// let profiler = Profiler::new();
    /// let parse = profiler.register("parse")?;
    ///
    /// {
    ///     let _span = profiler.enter(parse)?;
    ///     // Work done here is attributed to "parse".
    /// }
    ///
    /// assert_eq!(profiler.depth(), 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn enter(&self, id: RegionId) -> Result<Span<'_>> {
        self.start(id)?;
        Ok(Span::new(self, id))
    }

    /// Number of currently open regions.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.state.borrow().open.len()
    }

    /// Checks that every started region has been stopped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unclosed`] naming the innermost open region if any region is open.
    pub fn ensure_balanced(&self) -> Result<()> {
        let state = self.state.borrow();

        match state.open.last() {
            None => Ok(()),
            Some(innermost) => Err(Error::Unclosed {
                innermost: state.registry.get(innermost.id)?.name.clone(),
                depth: state.open.len(),
            }),
        }
    }

    /// Name of a region, as stored (possibly truncated).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRegion`] if the identity was not issued by this profiler.
    pub fn name(&self, id: RegionId) -> Result<String> {
        Ok(self.state.borrow().registry.get(id)?.name.clone())
    }

    /// Cycles accumulated by a region since registration or the last reset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRegion`] if the identity was not issued by this profiler.
    pub fn total_cycles(&self, id: RegionId) -> Result<u64> {
        Ok(self.state.borrow().registry.get(id)?.total_cycles)
    }

    /// The region a region was first started inside of, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRegion`] if the identity was not issued by this profiler.
    pub fn parent(&self, id: RegionId) -> Result<Option<RegionId>> {
        Ok(self.state.borrow().registry.get(id)?.parent)
    }

    /// Number of registered regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.state.borrow().registry.len()
    }

    /// Takes a snapshot of the collected data.
    ///
    /// Regions that have not been started since registration or the last reset are omitted.
    /// Open regions are included with the cycles accumulated by their completed runs.
    #[must_use]
    pub fn report(&self) -> Report {
        let state = self.state.borrow();

        Report::from_registry(
            &state.registry,
            state
                .calibration
                .as_ref()
                .and_then(Calibration::cycles_per_second),
        )
    }

    /// Renders the collected data as a text table.
    ///
    /// This is equivalent to `self.report().to_string()`.
    #[must_use]
    pub fn render_report(&self) -> String {
        self.report().to_string()
    }

    #[cfg(all(test, not(feature = "disabled")))]
    pub(crate) fn with_platform(platform: PlatformFacade) -> Self {
        Self::builder().platform(platform).build()
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Configures and creates a [`Profiler`].
///
/// Use [`Profiler::builder()`] to create a new instance of this builder.
#[derive(Debug)]
#[must_use]
pub struct ProfilerBuilder {
    capacity: usize,
    max_name_length: usize,
    overlong_names: OverlongNames,
    platform: PlatformFacade,
}

impl ProfilerBuilder {
    fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            overlong_names: OverlongNames::default(),
            platform: PlatformFacade::real(),
        }
    }

    /// Sets the maximum number of regions. Defaults to [`DEFAULT_CAPACITY`].
    ///
    /// Storage for all regions is reserved when the profiler is built.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn capacity(self, capacity: usize) -> Self {
        assert!(capacity != 0, "capacity cannot be zero");

        Self { capacity, ..self }
    }

    /// Sets the maximum stored length of region names, in characters.
    /// Defaults to [`DEFAULT_MAX_NAME_LENGTH`].
    ///
    /// # Panics
    ///
    /// Panics if `max_name_length` is zero.
    pub fn max_name_length(self, max_name_length: usize) -> Self {
        assert!(max_name_length != 0, "max name length cannot be zero");

        Self {
            max_name_length,
            ..self
        }
    }

    /// Sets what happens to names longer than the maximum length.
    /// Defaults to [`OverlongNames::Truncate`].
    pub fn overlong_names(self, overlong_names: OverlongNames) -> Self {
        Self {
            overlong_names,
            ..self
        }
    }

    #[cfg(all(test, not(feature = "disabled")))]
    pub(crate) fn platform(self, platform: PlatformFacade) -> Self {
        Self { platform, ..self }
    }

    /// Creates the profiler.
    #[must_use]
    pub fn build(self) -> Profiler {
        Profiler {
            state: RefCell::new(ProfilerState {
                registry: Registry::new(self.capacity, self.max_name_length, self.overlong_names),
                open: Vec::with_capacity(self.capacity),
                calibration: None,
            }),
            platform: self.platform,
        }
    }
}
