//! Coverage gap detection.
//!
//! Given the span a caller asked for and the segments a query actually
//! covered, [`compute_gaps`] reports the missing time as disjoint segments
//! together with a three-way [`GapClassification`]. The classification maps
//! onto the process exit status a CLI caller reports (`0`/`1`/`2`), a
//! contract downstream automation branches on.

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// How much of a requested span was left uncovered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapClassification {
    /// The requested span is fully covered.
    NoGap,
    /// Some, but not all, of the requested span is missing.
    PartialGap,
    /// None of the requested span is covered.
    TotalGap,
}

impl GapClassification {
    /// Process exit status for a CLI caller: `NoGap` → 0, `PartialGap` → 1,
    /// `TotalGap` → 2.
    ///
    /// This mapping is a compatibility contract; downstream automation
    /// branches on the exit status.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NoGap => 0,
            Self::PartialGap => 1,
            Self::TotalGap => 2,
        }
    }
}

/// Result of comparing a requested span against covered segments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    missing: Vec<Segment>,
    classification: GapClassification,
}

impl GapReport {
    /// The uncovered portions of the requested span, as disjoint segments
    /// in ascending order.
    ///
    /// These are diagnostic output: a CLI caller prints them separately
    /// (to stderr), never mixed into the primary result stream.
    #[must_use]
    pub fn missing(&self) -> &[Segment] {
        &self.missing
    }

    /// The three-way coverage classification.
    #[must_use]
    pub const fn classification(&self) -> GapClassification {
        self.classification
    }

    /// Shorthand for `classification().exit_code()`.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.classification.exit_code()
    }

    /// Returns `true` if the requested span was fully covered.
    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Merges segments into a disjoint, sorted set of maximal segments.
///
/// Purely geometric: overlapping or touching segments merge regardless of
/// where they came from. Empty segments are dropped.
fn union(segments: &[Segment]) -> Vec<Segment> {
    let mut sorted: Vec<Segment> =
        segments.iter().copied().filter(|s| !s.is_empty()).collect();
    sorted.sort();

    let mut merged: Vec<Segment> = Vec::with_capacity(sorted.len());
    for seg in sorted {
        if let Some(last) = merged.last_mut() {
            if seg.connects(last) || seg.intersects(last) {
                *last = last.join(&seg);
                continue;
            }
        }
        merged.push(seg);
    }
    merged
}

/// Computes the parts of `requested` not covered by `covered`.
///
/// The covered segments are first union-coalesced (geometric merge,
/// identity ignored), then subtracted from the requested span. This never
/// fails: an empty requested span or an empty covered collection are valid
/// inputs with well-defined degenerate outputs.
///
/// # Examples
///
/// ```
/// use gwdatafind_segments::{compute_gaps, GapClassification, Segment};
///
/// let requested = Segment::new(1000, 1100)?;
/// let covered = [Segment::new(1020, 1080)?];
/// let report = compute_gaps(requested, &covered);
///
/// assert_eq!(report.classification(), GapClassification::PartialGap);
/// assert_eq!(report.missing(), &[
///     Segment::new(1000, 1020)?,
///     Segment::new(1080, 1100)?,
/// ]);
/// assert_eq!(report.exit_code(), 1);
/// # Ok::<(), gwdatafind_segments::SegmentError>(())
/// ```
#[must_use]
pub fn compute_gaps(requested: Segment, covered: &[Segment]) -> GapReport {
    let mut missing: Vec<Segment> = Vec::new();
    let mut cursor = requested.start();

    for seg in union(covered) {
        if seg.stop() <= cursor {
            continue;
        }
        if seg.start() >= requested.stop() {
            break;
        }
        if seg.start() > cursor {
            // Both bounds lie inside the requested span here, so the
            // constructor cannot observe reversed bounds.
            if let Ok(gap) = Segment::new(cursor, seg.start().min(requested.stop())) {
                missing.push(gap);
            }
        }
        cursor = cursor.max(seg.stop());
    }
    if cursor < requested.stop() {
        if let Ok(gap) = Segment::new(cursor, requested.stop()) {
            missing.push(gap);
        }
    }

    let classification = if missing.is_empty() {
        GapClassification::NoGap
    } else if missing.len() == 1 && missing[0] == requested {
        GapClassification::TotalGap
    } else {
        GapClassification::PartialGap
    };

    GapReport { missing, classification }
}
