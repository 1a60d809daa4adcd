//! Segment error types.

use thiserror::Error;

/// Errors arising from segment construction.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SegmentError {
    /// Segment bounds were supplied in the wrong order.
    #[error("segment stop ({stop}) precedes start ({start})")]
    ReversedBounds {
        /// Requested GPS start time.
        start: u64,
        /// Requested GPS stop time.
        stop: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SegmentError::ReversedBounds { start: 100, stop: 50 };
        assert_eq!(err.to_string(), "segment stop (50) precedes start (100)");
    }
}
