//! Output formatters for duplicate scan results.
//!
//! - Text for people (default)
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{ScanCoordinator, ScanOutcome};
//! use dupsweep::error::ExitCode;
//! use dupsweep::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let outcome = ScanCoordinator::default().run(Path::new(".")).unwrap();
//! if let ScanOutcome::Completed(report) = outcome {
//!     let output = JsonOutput::new(&report.groups, &report.summary, ExitCode::Success);
//!     println!("{}", output.to_json_pretty().unwrap());
//! }
//! ```

pub mod csv;
pub mod json;
pub mod text;

// Re-export main types
pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;
