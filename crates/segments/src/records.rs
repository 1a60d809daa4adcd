//! Cache file records and identity-based coalescing.
//!
//! A datafind query returns one [`FileRecord`] per frame file. Consecutive
//! files from the same observatory and dataset usually tile time in
//! fixed-size chunks, so the frame-cache ("wcache") output format collapses
//! them into one [`CoalescedRecord`] per maximal contiguous run. The merge
//! rule is deliberately conservative: records only join a run when they share
//! every identity attribute *and* the run's established per-file duration,
//! which keeps irregular-length files from corrupting a consumer's
//! assumption of fixed-size chunks.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// One file returned from a datafind query.
///
/// The interval is half-open GPS time, and `directory` is the directory
/// containing the file (not the file path itself).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Observatory code (e.g. `"H"`, `"L"`, `"V"`).
    pub observatory: String,
    /// Dataset description tag (e.g. `"H1_HOFT_C00"`).
    pub description: String,
    /// Half-open GPS interval covered by the file.
    pub segment: Segment,
    /// Directory containing the file.
    pub directory: PathBuf,
}

impl FileRecord {
    /// Creates a new file record.
    pub fn new(
        observatory: impl Into<String>,
        description: impl Into<String>,
        segment: Segment,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            observatory: observatory.into(),
            description: description.into(),
            segment,
            directory: directory.into(),
        }
    }

    /// Duration of the file's interval in GPS seconds.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.segment.duration()
    }
}

/// One maximal run of coalesced file records.
///
/// Shape and invariants match [`FileRecord`], except that `segment` may span
/// several source records. `Display` renders the record as one frame-cache
/// line: `{observatory} {description} {start} {stop} {duration} {directory}`,
/// where `duration` is the span of the whole run. The per-file chunk size is
/// kept in `file_duration` for the coalescing sweep but is not printed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoalescedRecord {
    /// Observatory code.
    pub observatory: String,
    /// Dataset description tag.
    pub description: String,
    /// Combined half-open GPS interval of the run.
    pub segment: Segment,
    /// Directory shared by every file in the run.
    pub directory: PathBuf,
    /// Per-file duration established by the run's first record.
    pub file_duration: u64,
}

impl From<FileRecord> for CoalescedRecord {
    fn from(record: FileRecord) -> Self {
        let file_duration = record.duration();
        Self {
            observatory: record.observatory,
            description: record.description,
            segment: record.segment,
            directory: record.directory,
            file_duration,
        }
    }
}

impl std::fmt::Display for CoalescedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.observatory,
            self.description,
            self.segment.start(),
            self.segment.stop(),
            self.segment.duration(),
            self.directory.display(),
        )
    }
}

/// Coalesces file records into minimal contiguous runs.
///
/// Records are sorted by `(observatory, description, segment)` and swept
/// left to right. A record extends the current run only when all of the
/// following hold:
///
/// - same observatory, description, and directory,
/// - its duration equals the run's established per-file duration,
/// - its segment connects to or intersects the run's accumulated segment.
///
/// Extension unions the segments; otherwise the run is emitted and the
/// record opens a new run (establishing a new per-file duration). The sweep
/// is a single pass, `O(n log n)` from the sort, and the sort is stable with
/// respect to ties in the key.
#[must_use]
pub fn coalesce(records: impl IntoIterator<Item = FileRecord>) -> Vec<CoalescedRecord> {
    let mut records: Vec<FileRecord> = records.into_iter().collect();
    records.sort_by(|a, b| {
        (a.observatory.as_str(), a.description.as_str(), a.segment)
            .cmp(&(b.observatory.as_str(), b.description.as_str(), b.segment))
    });

    let mut runs: Vec<CoalescedRecord> = Vec::new();
    for record in records {
        if let Some(run) = runs.last_mut() {
            let extends = run.file_duration != 0
                && record.observatory == run.observatory
                && record.description == run.description
                && record.directory == run.directory
                && record.duration() == run.file_duration
                && (record.segment.connects(&run.segment)
                    || record.segment.intersects(&run.segment));
            if extends {
                run.segment = run.segment.join(&record.segment);
                continue;
            }
        }
        runs.push(CoalescedRecord::from(record));
    }
    runs
}
