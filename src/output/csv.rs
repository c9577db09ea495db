//! CSV output formatter for duplicate scan results.
//!
//! One row is generated for each member of each duplicate group.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number, in report order
//! - `hash`: content digest (hexadecimal, empty for the zero-byte group)
//! - `size`: file size in bytes
//! - `path`: path to the file

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    hash: &'a str,
    size: u64,
    path: String,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the CSV output, header included, to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        if self.groups.is_empty() {
            csv_writer.write_record(["group_id", "hash", "size", "path"])?;
        }

        for (idx, group) in self.groups.iter().enumerate() {
            let hash = group.hash_hex();
            for path in &group.paths {
                csv_writer.serialize(CsvRow {
                    group_id: idx + 1,
                    hash: &hash,
                    size: group.size(),
                    path: path.to_string_lossy().into_owned(),
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::ContentKey;
    use std::path::PathBuf;

    #[test]
    fn test_csv_output_basic() {
        let groups = vec![
            DuplicateGroup::new(
                ContentKey::new(7, vec![0x0f; 4]),
                vec![PathBuf::from("/d/file1.txt"), PathBuf::from("/d/file2.txt")],
            ),
            DuplicateGroup::new(
                ContentKey::new(9, vec![0x10; 4]),
                vec![PathBuf::from("/d/x"), PathBuf::from("/d/y")],
            ),
        ];

        let csv_str = CsvOutput::new(&groups).to_string().unwrap();
        let lines: Vec<&str> = csv_str.lines().collect();

        assert_eq!(lines[0], "group_id,hash,size,path");
        assert_eq!(lines[1], "1,0f0f0f0f,7,/d/file1.txt");
        assert_eq!(lines[4], "2,10101010,9,/d/y");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_csv_output_empty_has_header() {
        let csv_str = CsvOutput::new(&[]).to_string().unwrap();
        assert_eq!(csv_str.trim(), "group_id,hash,size,path");
    }

    #[test]
    fn test_csv_output_quoting() {
        let groups = vec![DuplicateGroup::new(
            ContentKey::new(7, vec![0]),
            vec![PathBuf::from("/d/file,with,comma.txt"), PathBuf::from("/d/b")],
        )];

        let csv_str = CsvOutput::new(&groups).to_string().unwrap();

        assert!(csv_str.contains("\"/d/file,with,comma.txt\""));
    }
}
