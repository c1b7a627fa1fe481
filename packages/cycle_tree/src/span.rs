//! Scoped guards that close a region when they go out of scope.

use std::marker::PhantomData;

use crate::error::Result;
use crate::{Profiler, RegionId};

/// An open region of a [`Profiler`] that is stopped when the span is dropped.
///
/// Created by [`Profiler::enter()`]. Because spans are dropped in reverse order of creation,
/// spans bound to local variables always satisfy the nesting requirements of the profiler,
/// including on early return and unwinding.
///
/// # Examples
///
/// ```
/// use cycle_tree::Profiler;
///
/// # fn main() -> Result<(), cycle_tree::Error> {
/// let profiler = Profiler::new();
/// let load = profiler.register("load")?;
/// let decode = profiler.register("decode")?;
///
/// {
///     let _load = profiler.enter(load)?;
///     let _decode = profiler.enter(decode)?;
///     // "decode" is recorded as nested inside "load".
/// }
///
/// println!("decode runs inside {:?}", profiler.parent(decode)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
#[must_use = "the region is stopped as soon as the span is dropped"]
pub struct Span<'a> {
    profiler: &'a Profiler,
    id: RegionId,
    stopped: bool,
}

impl<'a> Span<'a> {
    pub(crate) fn new(profiler: &'a Profiler, id: RegionId) -> Self {
        Self {
            profiler,
            id,
            stopped: false,
        }
    }

    /// The region this span keeps open.
    #[must_use]
    pub fn region(&self) -> RegionId {
        self.id
    }

    /// Stops the region now, returning the cycles elapsed since the span was created.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Profiler::stop()`] if the region is not the innermost open
    /// region, for example because the span outlived a span created after it.
    pub fn stop(mut self) -> Result<u64> {
        self.stopped = true;
        self.profiler.stop(self.id)
    }
}

impl Drop for Span<'_> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }

        if let Err(error) = self.profiler.stop(self.id) {
            tracing::warn!(region = %self.id, %error, "span could not stop its region");
        }
    }
}

/// An open region of the current thread's profiler that is stopped when the span is dropped.
///
/// Created by [`enter()`](crate::enter). The span is bound to the thread that created it.
#[derive(Debug)]
#[must_use = "the region is stopped as soon as the span is dropped"]
pub struct LocalSpan {
    id: RegionId,
    stopped: bool,

    _single_threaded: PhantomData<*const ()>,
}

impl LocalSpan {
    pub(crate) fn new(id: RegionId) -> Self {
        Self {
            id,
            stopped: false,
            _single_threaded: PhantomData,
        }
    }

    /// The region this span keeps open.
    #[must_use]
    pub fn region(&self) -> RegionId {
        self.id
    }

    /// Stops the region now, returning the cycles elapsed since the span was created.
    ///
    /// # Errors
    ///
    /// Returns the error of [`stop()`](crate::stop) if the region is not the innermost open
    /// region of the current thread.
    pub fn stop(mut self) -> Result<u64> {
        self.stopped = true;
        crate::stop(self.id)
    }
}

impl Drop for LocalSpan {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }

        if let Err(error) = crate::stop(self.id) {
            tracing::warn!(region = %self.id, %error, "span could not stop its region");
        }
    }
}

#[cfg(all(test, not(feature = "disabled")))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::Error;
    use crate::pal::{FakePlatform, PlatformFacade};

    assert_not_impl_any!(LocalSpan: Send, Sync);
    assert_not_impl_any!(Span<'static>: Send, Sync);

    fn create_test_profiler() -> (Profiler, FakePlatform) {
        let fake_platform = FakePlatform::new();
        let profiler = Profiler::with_platform(PlatformFacade::fake(fake_platform.clone()));
        (profiler, fake_platform)
    }

    #[test]
    fn drop_stops_region() {
        let (profiler, platform) = create_test_profiler();
        let a = profiler.register("a").unwrap();

        {
            let span = profiler.enter(a).unwrap();
            assert_eq!(span.region(), a);
            assert_eq!(profiler.depth(), 1);
            platform.advance_cycles(75);
        }

        assert_eq!(profiler.depth(), 0);
        assert_eq!(profiler.total_cycles(a).unwrap(), 75);
    }

    #[test]
    fn explicit_stop_returns_elapsed_and_does_not_stop_twice() {
        let (profiler, platform) = create_test_profiler();
        let a = profiler.register("a").unwrap();

        let span = profiler.enter(a).unwrap();
        platform.advance_cycles(30);

        assert_eq!(span.stop().unwrap(), 30);
        assert_eq!(profiler.total_cycles(a).unwrap(), 30);
        assert_eq!(profiler.depth(), 0);
    }

    #[test]
    fn nested_spans_link_parent() {
        let (profiler, _platform) = create_test_profiler();
        let outer = profiler.register("outer").unwrap();
        let inner = profiler.register("inner").unwrap();

        {
            let _outer = profiler.enter(outer).unwrap();
            let _inner = profiler.enter(inner).unwrap();
        }

        assert_eq!(profiler.parent(inner).unwrap(), Some(outer));
        profiler.ensure_balanced().unwrap();
    }

    #[test]
    fn stops_region_on_early_return() {
        fn fallible(profiler: &Profiler, id: RegionId) -> Result<()> {
            let _span = profiler.enter(id)?;
            Err(Error::CalibrationUnset)
        }

        let (profiler, _platform) = create_test_profiler();
        let a = profiler.register("a").unwrap();

        fallible(&profiler, a).unwrap_err();

        assert_eq!(profiler.depth(), 0);
    }

    #[test]
    fn out_of_order_drop_does_not_panic() {
        let (profiler, _platform) = create_test_profiler();
        let outer = profiler.register("outer").unwrap();
        let inner = profiler.register("inner").unwrap();

        let outer_span = profiler.enter(outer).unwrap();
        let inner_span = profiler.enter(inner).unwrap();

        // Dropping the outer span first fails to stop it but must not panic.
        drop(outer_span);
        assert_eq!(profiler.depth(), 2);

        drop(inner_span);
        assert_eq!(profiler.depth(), 1);

        assert!(matches!(
            profiler.ensure_balanced(),
            Err(Error::Unclosed { depth: 1, .. })
        ));
    }
}
