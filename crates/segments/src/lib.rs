//! # GWDataFind segment algebra
//!
//! Interval handling for datafind query results: half-open GPS
//! [`Segment`]s, identity-based coalescing of per-file cache records into
//! minimal contiguous runs, and coverage gap detection against a requested
//! span.
//!
//! Everything in this crate is synchronous and side-effect-free; repeated
//! calls are independent and safe to run concurrently.
//!
//! # Example
//!
//! ```
//! use gwdatafind_segments::{coalesce, compute_gaps, FileRecord, GapClassification, Segment};
//!
//! let records = vec![
//!     FileRecord::new("H", "H1_HOFT_C00", Segment::new(0, 64)?, "/data/H1"),
//!     FileRecord::new("H", "H1_HOFT_C00", Segment::new(64, 128)?, "/data/H1"),
//! ];
//!
//! // Two contiguous 64s files collapse into one frame-cache run.
//! let runs = coalesce(records);
//! assert_eq!(runs.len(), 1);
//! assert_eq!(runs[0].segment, Segment::new(0, 128)?);
//!
//! // The run covers the first half of a 256s request.
//! let report = compute_gaps(Segment::new(0, 256)?, &[runs[0].segment]);
//! assert_eq!(report.classification(), GapClassification::PartialGap);
//! # Ok::<(), gwdatafind_segments::SegmentError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Segment error types.
pub mod error;
/// Coverage gap detection.
pub mod gaps;
/// Cache records and identity coalescing.
pub mod records;
/// Half-open GPS segments.
pub mod segment;

pub use error::SegmentError;
pub use gaps::{GapClassification, GapReport, compute_gaps};
pub use records::{CoalescedRecord, FileRecord, coalesce};
pub use segment::Segment;
