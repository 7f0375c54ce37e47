//! Crawl events and observers
//!
//! Components never log directly about crawl progress. They emit
//! [`CrawlEvent`]s to an injected [`CrawlObserver`]; the default
//! [`TracingObserver`] turns each event into a `tracing` line, and
//! [`RecordingObserver`] keeps them in memory so callers can inspect exactly
//! what happened during a run.

use crate::state::TraversalOutcome;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something noteworthy that happened during a crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// Traversal is starting from the base URL
    TraversalStarted { base_url: String, max_depth: u32 },

    /// The traversal engine disposed of a URL
    Traversal {
        url: String,
        depth: u32,
        outcome: TraversalOutcome,
        /// Admissible links found on the page (0 unless expanded)
        links_found: usize,
    },

    /// A fetch attempt failed and will be retried after `delay`
    FetchRetry {
        url: String,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        cause: String,
    },

    /// A fetch gave up
    FetchFailed {
        url: String,
        attempts: u32,
        cause: String,
    },

    /// Charset detection was inconclusive and the fallback encoding was used
    DecodingFallback { url: String, encoding: &'static str },

    /// The page body matched content already extracted from another URL
    DuplicateContent { url: String },

    /// A page record was extracted
    PageExtracted { url: String, title: String },

    /// PDF links were found on a page
    PdfLinksFound { url: String, count: usize },

    /// An asset was written to disk
    AssetDownloaded { url: String, path: PathBuf, bytes: usize },

    /// An asset could not be fetched or written
    AssetFailed { url: String, cause: String },

    /// The output table was written
    TableWritten { path: PathBuf, rows: usize },

    /// The output table could not be written
    TableFailed { path: PathBuf, cause: String },

    /// The run was cancelled or hit its deadline during `phase`
    Cancelled { phase: &'static str },
}

/// Receives crawl events
///
/// Implementations must be cheap and non-blocking: events are emitted from
/// inside concurrent fetch tasks.
pub trait CrawlObserver: Send + Sync {
    fn on_event(&self, event: &CrawlEvent);
}

/// Shared observer handle passed to every component
pub type SharedObserver = Arc<dyn CrawlObserver>;

/// Observer that writes every event to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn on_event(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::TraversalStarted {
                base_url,
                max_depth,
            } => {
                tracing::info!("Starting traversal at {} (max depth {})", base_url, max_depth);
            }
            CrawlEvent::Traversal {
                url,
                depth,
                outcome,
                links_found,
            } => match outcome {
                TraversalOutcome::Expanded => {
                    tracing::info!("Crawled {} at depth {}: {} links", url, depth, links_found);
                }
                TraversalOutcome::SkippedDepth => {
                    tracing::info!("Maximum depth reached at {} (depth {})", url, depth);
                }
                TraversalOutcome::SkippedEmpty => {
                    tracing::warn!("No content for {} at depth {}", url, depth);
                }
                TraversalOutcome::SkippedVisited => {
                    tracing::debug!("Already visited {}", url);
                }
                TraversalOutcome::SkippedLimit => {
                    tracing::info!("Page limit reached, not visiting {}", url);
                }
                TraversalOutcome::Cancelled => {
                    tracing::warn!("Traversal cancelled before {}", url);
                }
            },
            CrawlEvent::FetchRetry {
                url,
                attempt,
                max_attempts,
                delay,
                cause,
            } => {
                tracing::warn!(
                    "Request failed for {} (attempt {}/{}): {}. Retrying in {:?}",
                    url,
                    attempt,
                    max_attempts,
                    cause,
                    delay
                );
            }
            CrawlEvent::FetchFailed {
                url,
                attempts,
                cause,
            } => {
                tracing::error!(
                    "Request failed for {} after {} attempt(s): {}",
                    url,
                    attempts,
                    cause
                );
            }
            CrawlEvent::DecodingFallback { url, encoding } => {
                tracing::warn!(
                    "Encoding detection failed for {}, falling back to {}",
                    url,
                    encoding
                );
            }
            CrawlEvent::DuplicateContent { url } => {
                tracing::info!("Skipping duplicate content for {}", url);
            }
            CrawlEvent::PageExtracted { url, title } => {
                tracing::debug!("Extracted contents from {} ({})", url, title);
            }
            CrawlEvent::PdfLinksFound { url, count } => {
                tracing::debug!("Found {} PDF link(s) on {}", count, url);
            }
            CrawlEvent::AssetDownloaded { url, path, bytes } => {
                tracing::info!("Downloaded {} to {} ({} bytes)", url, path.display(), bytes);
            }
            CrawlEvent::AssetFailed { url, cause } => {
                tracing::error!("Failed to download {}: {}", url, cause);
            }
            CrawlEvent::TableWritten { path, rows } => {
                tracing::info!("Saved {} page record(s) to {}", rows, path.display());
            }
            CrawlEvent::TableFailed { path, cause } => {
                tracing::error!("Failed to save page records to {}: {}", path.display(), cause);
            }
            CrawlEvent::Cancelled { phase } => {
                tracing::warn!("Crawl cancelled during {} phase", phase);
            }
        }
    }
}

/// Observer that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far, in arrival order
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of received events matching a predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CrawlEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl CrawlObserver for RecordingObserver {
    fn on_event(&self, event: &CrawlEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&CrawlEvent::DuplicateContent {
            url: "https://x.test/a".to_string(),
        });
        observer.on_event(&CrawlEvent::Cancelled { phase: "download" });

        let events = observer.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], CrawlEvent::DuplicateContent { .. }));
        assert!(matches!(events[1], CrawlEvent::Cancelled { phase: "download" }));
    }

    #[test]
    fn test_count_with_predicate() {
        let observer = RecordingObserver::new();
        for i in 0..3 {
            observer.on_event(&CrawlEvent::FetchFailed {
                url: format!("https://x.test/{}", i),
                attempts: 3,
                cause: "timeout".to_string(),
            });
        }
        observer.on_event(&CrawlEvent::DuplicateContent {
            url: "https://x.test/d".to_string(),
        });

        assert_eq!(
            observer.count(|e| matches!(e, CrawlEvent::FetchFailed { .. })),
            3
        );
    }
}
