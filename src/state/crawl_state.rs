use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Content digest used to recognize the same page served under different URLs
pub type Fingerprint = [u8; 32];

/// One row of the output table
///
/// Created once per unique, non-duplicate page and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    /// Meta tags flattened as `key: value` pairs joined by `; `
    pub metadata: String,
    /// Visible text, one trimmed text node per line
    pub contents: String,
}

/// Mutable state of a single crawl run
///
/// Shared between the traversal and the concurrent extraction and download
/// phases. Each collection has its own lock, and every check-then-insert is
/// one locked operation, so concurrent callers can never both win the same
/// insert.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited_urls: Mutex<HashSet<String>>,
    visited_content_hashes: Mutex<HashSet<Fingerprint>>,
    page_urls: Mutex<PageUrls>,
    pdf_urls: Mutex<BTreeSet<String>>,
    page_records: Mutex<Vec<PageRecord>>,
}

/// Discovery-ordered URL list with O(1) membership
#[derive(Debug, Default)]
struct PageUrls {
    order: Vec<String>,
    seen: HashSet<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding one of these locks cannot leave a set half-updated
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL as visited
    ///
    /// Returns `true` if the URL was not visited before.
    pub fn mark_visited(&self, url: &str) -> bool {
        let mut visited = lock(&self.visited_urls);
        if visited.contains(url) {
            return false;
        }
        visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        lock(&self.visited_urls).contains(url)
    }

    pub fn visited_count(&self) -> usize {
        lock(&self.visited_urls).len()
    }

    /// Registers a content fingerprint
    ///
    /// Returns `true` exactly once per distinct fingerprint; every later call
    /// with the same digest returns `false` (duplicate content).
    pub fn register_fingerprint(&self, fingerprint: Fingerprint) -> bool {
        lock(&self.visited_content_hashes).insert(fingerprint)
    }

    pub fn fingerprint_count(&self) -> usize {
        lock(&self.visited_content_hashes).len()
    }

    /// Appends a discovered page URL, keeping discovery order
    ///
    /// Returns `false` without changing anything if the URL is already listed.
    pub fn push_page_url(&self, url: &str) -> bool {
        let mut page_urls = lock(&self.page_urls);
        if !page_urls.seen.insert(url.to_string()) {
            return false;
        }
        page_urls.order.push(url.to_string());
        true
    }

    /// Snapshot of the page URLs in discovery order
    pub fn page_urls(&self) -> Vec<String> {
        lock(&self.page_urls).order.clone()
    }

    /// Adds a PDF URL to the download set
    ///
    /// Returns `true` if the URL was new.
    pub fn insert_pdf_url(&self, url: &str) -> bool {
        lock(&self.pdf_urls).insert(url.to_string())
    }

    /// Snapshot of the PDF URLs, sorted
    pub fn pdf_urls(&self) -> Vec<String> {
        lock(&self.pdf_urls).iter().cloned().collect()
    }

    pub fn push_record(&self, record: PageRecord) {
        lock(&self.page_records).push(record);
    }

    pub fn record_count(&self) -> usize {
        lock(&self.page_records).len()
    }

    /// Snapshot of the accumulated records
    pub fn records(&self) -> Vec<PageRecord> {
        lock(&self.page_records).clone()
    }
}
