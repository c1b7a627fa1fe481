use thiserror::Error;

use crate::RegionId;

/// Errors that can occur when registering, entering or leaving regions, or when
/// delivering a report to its destination.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Every region slot of the profiler is already in use.
    #[error("cannot register region '{name}': all {capacity} region slots are in use")]
    CapacityExceeded {
        /// Name of the region that could not be registered.
        name: String,

        /// The configured maximum number of regions.
        capacity: usize,
    },

    /// The region name is longer than the configured maximum and the profiler was
    /// configured to reject such names instead of truncating them.
    #[error("region name '{name}' is {length} characters long, the limit is {max_length}")]
    NameTooLong {
        /// The rejected name.
        name: String,

        /// Length of the rejected name, in characters.
        length: usize,

        /// The configured maximum name length, in characters.
        max_length: usize,
    },

    /// The region identity was not issued by this profiler.
    #[error("region {id} was not registered with this profiler")]
    UnknownRegion {
        /// The unrecognized identity.
        id: RegionId,
    },

    /// A region was stopped without being open.
    #[error("cannot stop region '{name}' because it is not open")]
    NotOpen {
        /// Name of the region that was stopped.
        name: String,
    },

    /// A region was stopped while a region nested inside it was still open.
    #[error("cannot stop region '{name}' while '{innermost}' is still open inside it")]
    OutOfOrderStop {
        /// Name of the region that was stopped.
        name: String,

        /// Name of the innermost region that is still open.
        innermost: String,
    },

    /// Regions were still open when the caller required every region to be closed.
    #[error("{depth} region(s) still open, the innermost is '{innermost}'")]
    Unclosed {
        /// Name of the innermost open region.
        innermost: String,

        /// Number of open regions.
        depth: usize,
    },

    /// Cycles cannot be converted to seconds because calibration has not run
    /// or observed no cycles.
    #[error("the profiler has not been calibrated")]
    CalibrationUnset,

    /// Writing a report to its destination failed.
    #[error("failed to write report")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for profiler operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;
    use std::io;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn messages_name_the_regions_involved() {
        let error = Error::OutOfOrderStop {
            name: "outer".to_string(),
            innermost: "inner".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "cannot stop region 'outer' while 'inner' is still open inside it"
        );
    }

    #[test]
    fn io_error_converts() {
        let error: Error = io::Error::other("disk full").into();

        assert!(matches!(error, Error::Io(_)));
    }
}
