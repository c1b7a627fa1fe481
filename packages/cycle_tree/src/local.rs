//! The current thread's profiler, for instrumenting code without passing a profiler around.
//!
//! Each thread has its own independent [`Profiler`] with the default configuration. Regions
//! registered on one thread are unknown to the profiler of any other thread, and each thread
//! that wants cycles converted to seconds must call [`initialize()`] itself. Per-thread
//! reports can be combined with [`Report::merge()`].

use std::time::Duration;

use crate::error::Result;
use crate::{Calibration, LocalSpan, Profiler, RegionId, Report};

thread_local! {
    static LOCAL_PROFILER: Profiler = Profiler::new();
}

/// Clears the current thread's collected data, then calibrates its cycle counter over
/// `window`, blocking for that long.
///
/// See [`Profiler::initialize()`].
///
/// # Panics
///
/// Panics if `window` is shorter than one millisecond.
pub fn initialize(window: Duration) -> Calibration {
    LOCAL_PROFILER.with(|profiler| profiler.initialize(window))
}

/// Clears the current thread's collected data.
///
/// See [`Profiler::reset()`].
pub fn reset() {
    LOCAL_PROFILER.with(Profiler::reset);
}

/// Registers a new region with the current thread's profiler.
///
/// See [`Profiler::register()`]. The [`region!`](crate::region!) macro does this once per
/// call site and thread.
///
/// # Errors
///
/// Same as [`Profiler::register()`].
pub fn register(name: &str) -> Result<RegionId> {
    LOCAL_PROFILER.with(|profiler| profiler.register(name))
}

/// Returns the identity of the first region of the current thread's profiler registered
/// under `name`, registering it if there is none yet.
///
/// See [`Profiler::region()`].
///
/// # Errors
///
/// Same as [`Profiler::register()`].
pub fn region(name: &str) -> Result<RegionId> {
    LOCAL_PROFILER.with(|profiler| profiler.region(name))
}

/// Opens a region of the current thread's profiler.
///
/// See [`Profiler::start()`].
///
/// # Errors
///
/// Same as [`Profiler::start()`].
pub fn start(id: RegionId) -> Result<()> {
    LOCAL_PROFILER.with(|profiler| profiler.start(id))
}

/// Closes the innermost open region of the current thread's profiler.
///
/// See [`Profiler::stop()`].
///
/// # Errors
///
/// Same as [`Profiler::stop()`].
pub fn stop(id: RegionId) -> Result<u64> {
    LOCAL_PROFILER.with(|profiler| profiler.stop(id))
}

/// Opens a region of the current thread's profiler and returns a guard that closes it when
/// dropped.
///
/// # Errors
///
/// Same as [`Profiler::start()`].
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), cycle_tree::Error> {
/// fn checksum(data: &[u8]) -> Result<u32, cycle_tree::Error> {
///     let _span = cycle_tree::enter(cycle_tree::region!("checksum")?)?;
///     Ok(data.iter().map(|&b| u32::from(b)).sum())
/// }
///
/// checksum(b"hello")?;
/// checksum(b"world")?;
///
/// for region in cycle_tree::report().regions() {
///     println!("{}: {} cycles", region.name(), region.total_cycles());
/// }
/// # Ok(())
/// # }
/// ```
pub fn enter(id: RegionId) -> Result<LocalSpan> {
    start(id)?;
    Ok(LocalSpan::new(id))
}

/// Number of currently open regions of the current thread's profiler.
#[must_use]
pub fn depth() -> usize {
    LOCAL_PROFILER.with(Profiler::depth)
}

/// Checks that every region the current thread started has been stopped.
///
/// # Errors
///
/// Same as [`Profiler::ensure_balanced()`].
pub fn ensure_balanced() -> Result<()> {
    LOCAL_PROFILER.with(Profiler::ensure_balanced)
}

/// Takes a snapshot of the data collected by the current thread.
#[must_use]
pub fn report() -> Report {
    LOCAL_PROFILER.with(Profiler::report)
}

/// Renders the data collected by the current thread as a text table.
#[must_use]
pub fn render_report() -> String {
    LOCAL_PROFILER.with(Profiler::render_report)
}

/// Registers a region with the current thread's profiler once per call site and thread,
/// evaluating to a `Result` with its [`RegionId`](crate::RegionId).
///
/// Every expansion of the macro is its own region, even if another call site uses the same
/// name. Repeated evaluation of the same call site on the same thread yields the same
/// identity, so loops and recursion accumulate into one region.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), cycle_tree::Error> {
/// for _ in 0..3 {
///     let _span = cycle_tree::enter(cycle_tree::region!("loop_body")?)?;
/// }
///
/// print!("{}", cycle_tree::render_report());
/// # Ok(())
/// # }
/// ```
///
/// With the `disabled` feature, the macro registers nothing and evaluates to a placeholder
/// identity that starting and stopping ignore.
#[cfg(not(feature = "disabled"))]
#[macro_export]
macro_rules! region {
    ($name:expr) => {{
        ::std::thread_local! {
            static REGION: ::std::cell::Cell<::std::option::Option<$crate::RegionId>> =
                const { ::std::cell::Cell::new(::std::option::Option::None) };
        }

        REGION.with(|cached| match cached.get() {
            ::std::option::Option::Some(id) => ::std::result::Result::Ok(id),
            ::std::option::Option::None => $crate::register($name).map(|id| {
                cached.set(::std::option::Option::Some(id));
                id
            }),
        })
    }};
}

#[cfg(feature = "disabled")]
#[macro_export]
macro_rules! region {
    ($name:expr) => {{
        let _: &str = $name;
        ::std::result::Result::<$crate::RegionId, $crate::Error>::Ok($crate::RegionId::disabled())
    }};
}

#[cfg(all(test, not(feature = "disabled")))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::thread;

    use super::*;
    use crate::Error;

    // Every test runs on its own thread, so each test sees a fresh profiler.

    #[test]
    fn enter_links_nested_regions() {
        let outer = register("outer").unwrap();
        let inner = register("inner").unwrap();

        {
            let _outer = enter(outer).unwrap();
            assert_eq!(depth(), 1);
            let _inner = enter(inner).unwrap();
            assert_eq!(depth(), 2);
        }

        ensure_balanced().unwrap();

        let names: Vec<_> = report()
            .regions()
            .map(|region| (region.name().to_owned(), region.depth()))
            .collect();
        assert_eq!(
            names,
            [("outer".to_owned(), 0), ("inner".to_owned(), 1)]
        );
    }

    #[test]
    fn start_and_stop_accumulate() {
        let id = region("manual").unwrap();

        start(id).unwrap();
        stop(id).unwrap();
        start(id).unwrap();
        stop(id).unwrap();

        assert_eq!(region("manual").unwrap(), id);
        assert_eq!(report().regions().count(), 1);
    }

    #[test]
    fn stop_without_start_is_an_error() {
        let id = register("lonely").unwrap();

        assert!(matches!(stop(id), Err(Error::NotOpen { .. })));
    }

    #[test]
    fn local_span_explicit_stop() {
        let id = register("explicit").unwrap();

        let span = enter(id).unwrap();
        assert_eq!(span.region(), id);
        span.stop().unwrap();

        assert_eq!(depth(), 0);
    }

    #[test]
    fn reset_empties_report() {
        let id = register("gone").unwrap();
        drop(enter(id).unwrap());
        assert!(!report().is_empty());

        reset();

        assert!(report().is_empty());
        assert!(render_report().ends_with("-\n"));
    }

    #[test]
    fn macro_caches_identity_per_call_site() {
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(crate::region!("cached").unwrap());
        }
        let other_site = crate::region!("cached").unwrap();

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_ne!(other_site, ids[0]);
    }

    #[test]
    fn threads_have_independent_profilers() {
        let id = register("main_thread").unwrap();
        drop(enter(id).unwrap());

        let other_count = thread::spawn(|| {
            let id = register("other_thread").unwrap();
            drop(enter(id).unwrap());
            report().regions().count()
        })
        .join()
        .unwrap();

        assert_eq!(other_count, 1);

        let names: Vec<_> = report()
            .regions()
            .map(|region| region.name().to_owned())
            .collect();
        assert_eq!(names, ["main_thread"]);
    }

    #[test]
    fn initialize_calibrates_local_profiler() {
        let calibration = initialize(Duration::from_millis(5));

        assert_eq!(calibration.window(), Duration::from_millis(5));
        assert!(report().is_empty());
    }
}
