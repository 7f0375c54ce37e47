//! Crawl report
//!
//! This module provides the counters gathered over one run and a formatted
//! stdout rendering of them.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of a finished (or cancelled) crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Entries in `page_urls` after the traversal
    pub pages_discovered: usize,

    /// URLs marked visited by the traversal, base URL included
    pub pages_visited: usize,

    /// Page records produced by extraction
    pub records_written: usize,

    /// Pages skipped because their content was already seen
    pub duplicates_skipped: usize,

    /// Pages that yielded no content in either phase
    pub pages_failed: usize,

    /// Unique PDF URLs found
    pub pdfs_discovered: usize,

    pub pdfs_downloaded: usize,
    pub pdf_failures: usize,

    /// The run was cancelled or hit its deadline
    pub cancelled: bool,

    /// The page table was saved
    pub table_written: bool,
}

impl CrawlReport {
    /// Creates an empty report starting now
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            pages_discovered: 0,
            pages_visited: 0,
            records_written: 0,
            duplicates_skipped: 0,
            pages_failed: 0,
            pdfs_discovered: 0,
            pdfs_downloaded: 0,
            pdf_failures: 0,
            cancelled: false,
            table_written: false,
        }
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Share of discovered pages that produced a record, as a percentage
    pub fn extraction_rate(&self) -> f64 {
        if self.pages_discovered == 0 {
            return 0.0;
        }
        (self.records_written as f64 / self.pages_discovered as f64) * 100.0
    }
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Run:");
    println!("  Started:  {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Duration: {} seconds", report.duration_seconds());
    if report.cancelled {
        println!("  Status:   cancelled (partial results)");
    } else {
        println!("  Status:   completed");
    }
    println!();

    println!("Pages:");
    println!("  Visited: {}", report.pages_visited);
    println!("  Discovered: {}", report.pages_discovered);
    println!("  Records written: {}", report.records_written);
    println!("  Duplicates skipped: {}", report.duplicates_skipped);
    println!("  Failed: {}", report.pages_failed);
    println!();

    println!("PDF documents:");
    println!("  Discovered: {}", report.pdfs_discovered);
    println!("  Downloaded: {}", report.pdfs_downloaded);
    println!("  Failed: {}", report.pdf_failures);
    println!();

    if !report.table_written {
        println!("Page table was NOT written");
        println!();
    }

    println!(
        "Extraction Rate: {:.1}% ({} / {} pages produced a record)",
        report.extraction_rate(),
        report.records_written,
        report.pages_discovered
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_start_is_empty() {
        let report = CrawlReport::start();
        assert_eq!(report.pages_discovered, 0);
        assert_eq!(report.records_written, 0);
        assert!(!report.cancelled);
        assert!(!report.table_written);
        assert_eq!(report.duration_seconds(), 0);
    }

    #[test]
    fn test_extraction_rate() {
        let mut report = CrawlReport::start();
        report.pages_discovered = 40;
        report.records_written = 30;

        assert!((report.extraction_rate() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_extraction_rate_zero_pages() {
        let report = CrawlReport::start();
        assert_eq!(report.extraction_rate(), 0.0);
    }

    #[test]
    fn test_finish_not_before_start() {
        let mut report = CrawlReport::start();
        report.finish();
        assert!(report.finished_at >= report.started_at);
    }
}
