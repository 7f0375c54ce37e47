//! CSV page table
//!
//! Writes the header `url,title,metadata,contents` followed by one row per
//! record. Fields containing separators, quotes or newlines are quoted by the
//! `csv` writer.

use crate::output::traits::{OutputResult, RecordSink};
use crate::state::PageRecord;
use std::fs;
use std::path::Path;

/// Column names of the page table, in order
pub const TABLE_HEADER: [&str; 4] = ["url", "title", "metadata", "contents"];

/// Record sink writing a CSV table
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvTableSink;

impl RecordSink for CsvTableSink {
    fn save(&self, records: &[PageRecord], path: &Path) -> OutputResult<usize> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(TABLE_HEADER)?;

        for record in records {
            writer.write_record([
                record.url.as_str(),
                record.title.as_str(),
                record.metadata.as_str(),
                record.contents.as_str(),
            ])?;
        }

        writer.flush()?;
        Ok(records.len())
    }
}
