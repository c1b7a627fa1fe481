//! Platform abstraction layer for the cycle counter and the millisecond clock.
//!
//! The profiler only ever talks to the platform through the [`Platform`] trait, which allows
//! tests to substitute a fake implementation whose clocks they control directly.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
