//! Size prefiltering and duplicate group types.
//!
//! # Overview
//!
//! Size filtering is the first stage of duplicate detection. Files are
//! bucketed by exact byte size; a file alone in its bucket cannot duplicate
//! anything and is never hashed.
//!
//! Empty files are special: every zero-byte file has the same content, so
//! two or more of them form one duplicate group without any hashing.
//!
//! # Example
//!
//! ```
//! use dupsweep::duplicates::filter_by_size;
//! use dupsweep::scanner::FileRecord;
//! use std::path::PathBuf;
//!
//! let records = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let outcome = filter_by_size(records);
//!
//! assert_eq!(outcome.stats.total_files, 3);
//! assert_eq!(outcome.candidates.len(), 2); // Two 1024-byte files
//! assert_eq!(outcome.total_candidate_bytes, 2048);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::{hash_to_hex, FileRecord};

/// Identity of a duplicate class: recorded size plus content digest.
///
/// Ordered by size, then by digest bytes lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ContentKey {
    /// File size in bytes
    pub size: u64,
    /// Content digest (empty for the zero-byte group, which is never hashed)
    pub hash: Vec<u8>,
}

impl ContentKey {
    /// Create a new content key.
    #[must_use]
    pub fn new(size: u64, hash: Vec<u8>) -> Self {
        Self { size, hash }
    }

    /// Key shared by all zero-byte files.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            size: 0,
            hash: Vec::new(),
        }
    }
}

/// Confirmed duplicate group of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Size and digest shared by every member
    pub key: ContentKey,
    /// Member paths, in arrival order
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(key: ContentKey, paths: Vec<PathBuf>) -> Self {
        Self { key, paths }
    }

    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.key.size
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.key.hash)
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Space reclaimable by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.key.size * self.duplicate_count() as u64
    }

    /// Number of redundant copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }
}

/// Statistics from the size filtering stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Files that entered the filter
    pub total_files: usize,
    /// Files discarded because no other file shares their size
    pub eliminated_unique: usize,
    /// Zero-byte files grouped without hashing
    pub empty_files: usize,
    /// Non-empty files that still need hashing
    pub candidates: usize,
}

impl GroupingStats {
    /// Files that could still be duplicates (candidates plus grouped empties).
    #[must_use]
    pub fn potential_duplicates(&self) -> usize {
        self.candidates + self.empty_files
    }

    /// Percentage of files eliminated by size comparison.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Output of [`filter_by_size`].
#[derive(Debug, Default)]
pub struct SizeFilterOutcome {
    /// Non-empty files sharing their size with at least one other file
    pub candidates: Vec<FileRecord>,
    /// Zero-byte files; empty unless there are at least two
    pub empty_files: Vec<PathBuf>,
    /// Sum of candidate sizes in bytes
    pub total_candidate_bytes: u64,
    /// Sum of whole KiB per candidate, the progress range lanes will fill
    pub total_candidate_units: u64,
    /// Filter statistics
    pub stats: GroupingStats,
}

/// Bucket records by exact size, keeping only buckets with 2+ files.
///
/// Zero-byte records are bucketed like any other size here; use
/// [`filter_by_size`] for the full prefilter with the empty-file rule.
#[must_use]
pub fn group_by_size(records: Vec<FileRecord>) -> BTreeMap<u64, Vec<FileRecord>> {
    let mut buckets: BTreeMap<u64, Vec<FileRecord>> = BTreeMap::new();
    for record in records {
        buckets.entry(record.size).or_default().push(record);
    }
    buckets.retain(|_, files| files.len() > 1);
    buckets
}

/// Prefilter collected files by size.
///
/// Size-unique files are dropped, zero-byte files are split off as a
/// ready-made group, and the remaining buckets are flattened (ascending size,
/// collection order within a size) into the candidate set.
#[must_use]
pub fn filter_by_size(records: Vec<FileRecord>) -> SizeFilterOutcome {
    let total_files = records.len();
    let buckets = group_by_size(records);

    let mut outcome = SizeFilterOutcome::default();
    for (size, files) in buckets {
        if size == 0 {
            outcome.empty_files = files.into_iter().map(|f| f.path).collect();
        } else {
            outcome.total_candidate_bytes += size * files.len() as u64;
            outcome.total_candidate_units += (size >> 10) * files.len() as u64;
            outcome.candidates.extend(files);
        }
    }

    outcome.stats = GroupingStats {
        total_files,
        eliminated_unique: total_files - outcome.candidates.len() - outcome.empty_files.len(),
        empty_files: outcome.empty_files.len(),
        candidates: outcome.candidates.len(),
    };

    log::debug!(
        "Size filter: {} -> {} potential duplicates ({} to hash, {} empty, {:.1}% eliminated)",
        total_files,
        outcome.stats.potential_duplicates(),
        outcome.stats.candidates,
        outcome.stats.empty_files,
        outcome.stats.elimination_rate()
    );

    outcome
}
