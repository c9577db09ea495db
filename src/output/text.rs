//! Human-readable text output.
//!
//! Each group is printed as a header `"<count> x <size>"` followed by its
//! member paths, one per indented line. A summary line closes the report.
//!
//! ```text
//! 2 x 1.2 MiB
//!     /photos/a.jpg
//!     /backup/a.jpg
//!
//! 1 duplicate group, 1 duplicate file, 1.2 MiB reclaimable
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Condition, Paint};

use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Text output formatter.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a ScanSummary,
    condition: Condition,
}

impl<'a> TextOutput<'a> {
    /// Create a text formatter.
    ///
    /// # Arguments
    ///
    /// * `color` - Whether ANSI styling may be emitted
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary, color: bool) -> Self {
        Self {
            groups,
            summary,
            condition: if color {
                Condition::ALWAYS
            } else {
                Condition::NEVER
            },
        }
    }

    /// Write every group and the summary line.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in self.groups {
            let header = format!("{} x {}", group.len(), ByteSize(group.size()));
            writeln!(writer, "{}", header.bold().green().whenever(self.condition))?;
            for path in &group.paths {
                writeln!(writer, "    {}", path.display())?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "{}", self.summary_line())?;
        Ok(())
    }

    fn summary_line(&self) -> String {
        let s = self.summary;
        if s.duplicate_groups == 0 {
            return format!("No duplicates found among {} files", s.total_files);
        }

        let mut line = format!(
            "{} duplicate {}, {} duplicate {}, {} reclaimable",
            s.duplicate_groups,
            plural(s.duplicate_groups, "group", "groups"),
            s.duplicate_files,
            plural(s.duplicate_files, "file", "files"),
            s.reclaimable_display()
        );
        if s.unhashable_files > 0 {
            line.push_str(&format!(
                " ({} {} could not be read)",
                s.unhashable_files,
                plural(s.unhashable_files, "file", "files")
            ));
        }
        line
    }

    /// Render to a string.
    ///
    /// # Errors
    ///
    /// Returns an error only if formatting fails.
    pub fn to_string(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn plural<'s>(n: usize, one: &'s str, many: &'s str) -> &'s str {
    if n == 1 {
        one
    } else {
        many
    }
}
