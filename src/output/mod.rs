//! Output module for persisting crawl results
//!
//! This module handles:
//! - Writing the page records to the CSV table
//! - Summarizing a run in a `CrawlReport`

pub mod stats;
mod table;
mod traits;

pub use stats::{print_report, CrawlReport};
pub use table::{CsvTableSink, TABLE_HEADER};
pub use traits::{OutputError, OutputResult, RecordSink};
