//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based candidate filtering
//! - Byte-balanced distribution of candidates across hashing lanes
//! - Content-key aggregation into duplicate groups
//! - Scan coordination, progress and cancellation
//! - Optional byte-for-byte confirmation of groups

pub mod aggregator;
pub mod distributor;
pub mod finder;
pub mod groups;
pub mod state;
pub mod verify;

// Re-export main types
pub use aggregator::Aggregator;
pub use distributor::{distribute, effective_lane_count, Lane};
pub use finder::{
    default_lanes, FinderError, ScanConfig, ScanCoordinator, ScanHandle, ScanOutcome, ScanReport,
    ScanSummary,
};
pub use groups::{
    filter_by_size, group_by_size, ContentKey, DuplicateGroup, GroupingStats, SizeFilterOutcome,
};
pub use state::{ScanPhase, ScanState};
pub use verify::{confirm_groups, files_equal};
