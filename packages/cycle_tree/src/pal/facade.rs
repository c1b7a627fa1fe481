//! Platform facade for switching between real and fake implementations.

#[cfg(test)]
use crate::pal::FakePlatform;
use crate::pal::abstractions::Platform;
use crate::pal::real::RealPlatform;

/// Either the real platform or, in tests, a fake one whose clocks the test controls.
#[derive(Debug, Clone)]
pub(crate) enum PlatformFacade {
    Real(RealPlatform),

    #[cfg(test)]
    Fake(FakePlatform),
}

impl PlatformFacade {
    pub(crate) fn real() -> Self {
        Self::Real(RealPlatform)
    }

    #[cfg(test)]
    pub(crate) fn fake(fake_platform: FakePlatform) -> Self {
        Self::Fake(fake_platform)
    }
}

impl Platform for PlatformFacade {
    #[inline]
    fn cycles(&self) -> u64 {
        match self {
            Self::Real(platform) => platform.cycles(),
            #[cfg(test)]
            Self::Fake(platform) => platform.cycles(),
        }
    }

    fn milliseconds(&self) -> u64 {
        match self {
            Self::Real(platform) => platform.milliseconds(),
            #[cfg(test)]
            Self::Fake(platform) => platform.milliseconds(),
        }
    }
}
