//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Worklist-driven directory collection (no call-stack recursion)
//! - Chunked content hashing with SHA-224 or BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`collector`]: Directory traversal and file discovery
//! - [`hasher`]: Block-wise file hashing with progress publication
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::FileCollector;
//! use std::path::Path;
//!
//! let collection = FileCollector::new(Path::new(".")).collect().unwrap();
//! for record in &collection.records {
//!     println!("{}: {} bytes", record.path.display(), record.size);
//! }
//! ```

pub mod collector;
pub mod hasher;

use std::path::PathBuf;

// Re-export main types
pub use collector::{Collection, FileCollector};
pub use hasher::{block_size_for, hash_to_hex, HashAlgorithm, Hasher};

/// A regular file discovered during collection.
///
/// The size is the value observed at collection time and is never
/// refreshed, even if the file changes before it is hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// File size in bytes
    pub size: u64,
    /// Path to the file
    pub path: PathBuf,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { size, path }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while touching `path`.
    pub(crate) fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while opening or reading `path`.
    pub(crate) fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// Path of the file that could not be hashed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}
