#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Manual instrumentation profiler that accumulates processor cycles per named region of
//! code, reconstructs how the regions nest and reports them as a tree, heaviest first.
//!
//! The core types are:
//! - [`Profiler`] - Owns the regions, tracks which region is open and holds the calibration
//! - [`RegionId`] - Identity of a registered region, typically one per call site
//! - [`Span`] - Keeps a region open until it is dropped
//! - [`Report`] - Snapshot of the collected data, rendered as an indented text table
//!
//! This package is meant as a development tool for finding where processor time goes in
//! single-threaded code paths such as game loops, parsers or batch jobs.
//!
//! # Simple usage
//!
//! ```
//! use std::time::Duration;
//!
//! use cycle_tree::Profiler;
//!
//! # fn main() -> Result<(), cycle_tree::Error> {
//! let profiler = Profiler::new();
//!
//! // Measures how fast the cycle counter ticks, so cycles can be shown as seconds.
//! profiler.initialize(Duration::from_millis(10));
//!
//! let load = profiler.register("load")?;
//! let parse = profiler.register("parse")?;
//!
//! {
//!     let _load = profiler.enter(load)?;
//!
//!     for _ in 0..10 {
//!         let _parse = profiler.enter(parse)?;
//!         std::hint::black_box(42 * 2);
//!     }
//! }
//!
//! profiler.report().print_to_stdout();
//! # Ok(())
//! # }
//! ```
//!
//! # Per-thread profiler
//!
//! Instead of passing a [`Profiler`] around, you can use the profiler of the current thread
//! through the free functions of this crate. The [`region!`] macro registers a region once per
//! call site.
//!
//! ```
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), cycle_tree::Error> {
//! cycle_tree::initialize(Duration::from_millis(10));
//!
//! fn fibonacci(n: u64) -> Result<u64, cycle_tree::Error> {
//!     let _span = cycle_tree::enter(cycle_tree::region!("fibonacci")?)?;
//!
//!     Ok(if n < 2 {
//!         n
//!     } else {
//!         fibonacci(n - 1)? + fibonacci(n - 2)?
//!     })
//! }
//!
//! fibonacci(10)?;
//!
//! cycle_tree::ensure_balanced()?;
//! println!("{}", cycle_tree::render_report());
//! # Ok(())
//! # }
//! ```
//!
//! # Nesting
//!
//! The parent of a region is whichever region was innermost when the region was first
//! started. Regions must be stopped in reverse order of starting. Spans enforce this
//! naturally; when calling [`Profiler::start()`] and [`Profiler::stop()`] directly, an
//! out-of-order stop is rejected with an error and leaves the collected data untouched.
//!
//! # Threading
//!
//! A [`Profiler`] is used from one thread at a time. The free functions of this crate operate
//! on a separate profiler for each thread, and the resulting reports can be combined with
//! [`Report::merge()`].
//!
//! # Accuracy
//!
//! Cycles are read from the processor's time stamp counter (`x86_64`) or virtual timer
//! (`aarch64`) and converted to seconds using a calibration pass that spins for a fixed window
//! of wall-clock time. Frequency scaling after calibration makes the seconds column drift.
//!
//! # Disabling instrumentation
//!
//! The `disabled` feature turns starting, stopping, calibrating and [`region!`] into no-ops
//! without removing any of the API, so instrumented code keeps compiling and reports are
//! simply empty.

mod calibration;
mod error;
mod local;
mod pal;
mod profiler;
mod region;
mod registry;
mod report;
mod span;

pub use calibration::*;
pub use error::Error;
pub use local::*;
pub use profiler::*;
pub(crate) use region::Region;
pub use region::RegionId;
pub(crate) use registry::Registry;
pub use registry::OverlongNames;
pub use report::*;
pub use span::*;
