//! File actions module.
//!
//! Deletion of duplicate files found by a scan:
//! - Permanent removal (default)
//! - Move to system trash (recoverable)
//! - Batch operations with per-path outcomes and no rollback
//!
//! ```no_run
//! use dupsweep::actions::{delete_files, DeleteMode};
//! use std::path::PathBuf;
//!
//! let report = delete_files(&[PathBuf::from("/path/to/duplicate.txt")], DeleteMode::Trash);
//! println!("{}", report.summary());
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{
    delete_file, delete_files, redundant_copies, DeleteError, DeleteMode, DeleteOutcome,
    DeleteReport,
};
