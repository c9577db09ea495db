//! Byte-balanced assignment of candidate files to hashing lanes.
//!
//! Hashing cost is roughly proportional to file size, so lanes are balanced
//! by aggregate bytes rather than file count. Files are taken largest first
//! and each goes to the lane with the smallest running total (lowest index on
//! ties), the longest-processing-time-first heuristic for makespan.
//!
//! Assignment is a pure, one-shot computation: every lane is fixed before any
//! worker starts, so no distribution state is shared between threads.
//!
//! # Example
//!
//! ```
//! use dupsweep::duplicates::distribute;
//! use dupsweep::scanner::FileRecord;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/big"), 900),
//!     FileRecord::new(PathBuf::from("/mid"), 500),
//!     FileRecord::new(PathBuf::from("/small1"), 400),
//!     FileRecord::new(PathBuf::from("/small2"), 400),
//! ];
//!
//! let lanes = distribute(files, 2);
//! assert_eq!(lanes.len(), 2);
//! assert_eq!(lanes[0].total_bytes, 1300);
//! assert_eq!(lanes[1].total_bytes, 900);
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::scanner::FileRecord;

/// One worker's ordered, exclusive share of the candidate files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lane {
    /// Position of this lane in the distribution
    pub index: usize,
    /// Files to hash, in order
    pub files: Vec<FileRecord>,
    /// Sum of the sizes of `files`
    pub total_bytes: u64,
}

impl Lane {
    fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Number of files in this lane.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this lane has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Number of lanes actually used for `candidates` files.
///
/// Clamped to `[1, min(requested, candidates)]`; zero candidates need zero
/// lanes.
#[must_use]
pub fn effective_lane_count(requested: usize, candidates: usize) -> usize {
    if candidates == 0 {
        return 0;
    }
    requested.max(1).min(candidates)
}

/// Split `candidates` into byte-balanced lanes.
///
/// Candidates are expected to be non-empty files; a zero-byte file never
/// raises its lane's total, so a run of them would pile onto one lane.
#[must_use]
pub fn distribute(mut candidates: Vec<FileRecord>, requested_lanes: usize) -> Vec<Lane> {
    let lane_count = effective_lane_count(requested_lanes, candidates.len());
    if lane_count == 0 {
        return Vec::new();
    }

    candidates.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));

    let mut lanes: Vec<Lane> = (0..lane_count).map(Lane::new).collect();
    let mut least_loaded: BinaryHeap<Reverse<(u64, usize)>> =
        (0..lane_count).map(|i| Reverse((0, i))).collect();

    for file in candidates {
        let Some(Reverse((load, index))) = least_loaded.pop() else {
            break;
        };
        let size = file.size;
        let lane = &mut lanes[index];
        lane.total_bytes += size;
        lane.files.push(file);
        least_loaded.push(Reverse((load + size, index)));
    }

    log::debug!(
        "Distributed files across {} lanes: {:?} bytes",
        lane_count,
        lanes.iter().map(|l| l.total_bytes).collect::<Vec<_>>()
    );

    lanes
}
