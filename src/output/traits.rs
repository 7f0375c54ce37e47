//! Output sink traits and errors
//!
//! This module defines the trait interface for record sinks.

use crate::state::PageRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record sinks
///
/// A sink persists the page records of one run. Saving replaces whatever a
/// previous run left at the same path.
pub trait RecordSink {
    /// Writes every record to `path`
    ///
    /// # Returns
    ///
    /// The number of rows written
    fn save(&self, records: &[PageRecord], path: &Path) -> OutputResult<usize>;
}
