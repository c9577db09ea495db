//! Block-wise file hasher with opportunistic progress publication.
//!
//! # Overview
//!
//! [`Hasher`] streams a file through an incremental digest in blocks whose
//! size grows with the square root of the file size, clamped to
//! [`MIN_BLOCK_SIZE`]..=[`MAX_BLOCK_SIZE`]. Small files pay little per-call
//! overhead and large files never burst more than 128 KiB of memory.
//!
//! # Progress
//!
//! Progress is measured in KiB of content read. After each full block the
//! hasher *tries* to publish through the shared [`ProgressSink`]; when the
//! lock is contended the delta stays pending and rides along with the next
//! successful attempt. The final (partial, possibly empty) block always
//! publishes, so a fully hashed file contributes exactly `bytes_read >> 10`
//! units.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::progress::NullSink;
//! use dupsweep::scanner::{hash_to_hex, HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Sha224);
//! let digest = hasher.hash_file(Path::new("photo.jpg"), &NullSink).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224};

use super::HashError;
use crate::progress::ProgressSink;

/// Smallest read block (16 KiB).
pub const MIN_BLOCK_SIZE: usize = 16 * 1024;

/// Largest read block (128 KiB).
pub const MAX_BLOCK_SIZE: usize = 128 * 1024;

/// Content digest algorithm.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-224, 28-byte digest
    #[default]
    Sha224,
    /// BLAKE3, 32-byte digest
    Blake3,
}

impl HashAlgorithm {
    /// Length of the finalized digest in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha224 => 28,
            Self::Blake3 => 32,
        }
    }

    fn accumulator(self) -> Accumulator {
        match self {
            Self::Sha224 => Accumulator::Sha224(Sha224::new()),
            Self::Blake3 => Accumulator::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha224 => f.write_str("sha224"),
            Self::Blake3 => f.write_str("blake3"),
        }
    }
}

enum Accumulator {
    Sha224(Sha224),
    Blake3(Box<blake3::Hasher>),
}

impl Accumulator {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha224(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha224(h) => h.finalize().to_vec(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
        }
    }
}

/// Read block size for a file of `file_size` bytes.
#[must_use]
pub fn block_size_for(file_size: u64) -> usize {
    let root = (file_size as f64).sqrt() as u64;
    root.clamp(MIN_BLOCK_SIZE as u64, MAX_BLOCK_SIZE as u64) as usize
}

/// Render a digest as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &[u8]) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Tracks bytes read for one file and how much of it has been published.
struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    bytes_read: u64,
    published: u64,
}

impl<'a> ProgressReporter<'a> {
    fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            bytes_read: 0,
            published: 0,
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.bytes_read += bytes as u64;
    }

    fn pending(&self) -> u64 {
        (self.bytes_read >> 10) - self.published
    }

    fn try_flush(&mut self) {
        let pending = self.pending();
        if pending > 0 && self.sink.try_publish(pending) {
            self.published += pending;
        }
    }

    fn flush(&mut self) {
        let pending = self.pending();
        if pending > 0 {
            self.sink.publish(pending);
            self.published += pending;
        }
    }
}

/// Content hasher for a single algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The configured digest algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the full content of `path`, publishing progress to `sink`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or a read fails
    /// part way through. Progress already published for the file stays
    /// published.
    pub fn hash_file(&self, path: &Path, sink: &dyn ProgressSink) -> Result<Vec<u8>, HashError> {
        let mut file =
            File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        let size = file
            .metadata()
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?
            .len();

        let block_size = block_size_for(size);
        log::trace!(
            "Hashing {} ({} bytes, {} byte blocks)",
            path.display(),
            size,
            block_size
        );

        let mut buffer = vec![0u8; block_size];
        let mut accumulator = self.algorithm.accumulator();
        let mut reporter = ProgressReporter::new(sink);

        loop {
            let filled = read_block(&mut file, &mut buffer)
                .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
            accumulator.update(&buffer[..filled]);
            reporter.advance(filled);

            if filled < block_size {
                reporter.flush();
                break;
            }
            reporter.try_flush();
        }

        Ok(accumulator.finalize())
    }
}

/// Fill `buffer` from `reader`, returning fewer bytes only at end of file.
pub(crate) fn read_block(reader: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
