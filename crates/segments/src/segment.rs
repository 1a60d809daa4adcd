//! Half-open GPS time segments.
//!
//! A [`Segment`] is a `[start, stop)` interval measured in GPS seconds, the
//! native timestamp of the datafind domain. The operations defined here
//! (`connects`, `intersects`, `join`) are the complete algebra needed by the
//! coalescing and gap-detection layers.

use serde::{Deserialize, Serialize};

use crate::error::SegmentError;

/// A half-open GPS time interval `[start, stop)`.
///
/// Invariant: `stop >= start`. A segment with `stop == start` is empty and
/// covers no time. Construction through [`Segment::new`] enforces the
/// invariant; a reversed pair is an error, not a panic.
///
/// Ordering is lexicographic on `(start, stop)`, which is exactly the sort
/// key used when coalescing cache records.
///
/// # Examples
///
/// ```
/// use gwdatafind_segments::Segment;
///
/// let a = Segment::new(0, 64)?;
/// let b = Segment::new(64, 128)?;
/// assert!(a.connects(&b));
/// assert!(!a.intersects(&b));
/// assert_eq!(a.join(&b), Segment::new(0, 128)?);
/// # Ok::<(), gwdatafind_segments::SegmentError>(())
/// ```
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Segment {
    start: u64,
    stop: u64,
}

impl Segment {
    /// Creates a segment from a `(start, stop)` GPS pair.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::ReversedBounds`] if `stop < start`.
    pub fn new(start: u64, stop: u64) -> Result<Self, SegmentError> {
        if stop < start {
            return Err(SegmentError::ReversedBounds { start, stop });
        }
        Ok(Self { start, stop })
    }

    /// GPS start time (inclusive).
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// GPS stop time (exclusive).
    #[must_use]
    pub const fn stop(&self) -> u64 {
        self.stop
    }

    /// Length of the segment in GPS seconds (`stop - start`).
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.stop - self.start
    }

    /// Returns `true` if the segment covers no time at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    /// Returns `true` if one segment's stop equals the other's start.
    ///
    /// Connecting segments touch without overlapping; their union is a
    /// single contiguous interval.
    #[must_use]
    pub const fn connects(&self, other: &Self) -> bool {
        self.stop == other.start || other.stop == self.start
    }

    /// Returns `true` if the segments share a non-empty intersection.
    ///
    /// Merely touching endpoints do not intersect; see [`connects`]. An
    /// empty segment intersects nothing, including a segment containing
    /// its position.
    ///
    /// [`connects`]: Self::connects
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        let start = if self.start > other.start { self.start } else { other.start };
        let stop = if self.stop < other.stop { self.stop } else { other.stop };
        start < stop
    }

    /// Returns the combined span of two segments.
    ///
    /// For connecting or intersecting segments this is their exact union;
    /// for disjoint segments it also covers the space between them, so
    /// callers must check [`connects`]/[`intersects`] first when a strict
    /// union is required.
    ///
    /// [`connects`]: Self::connects
    /// [`intersects`]: Self::intersects
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            stop: self.stop.max(other.stop),
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}
