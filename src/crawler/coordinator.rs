//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs the three phases of a crawl:
//! - Traversal: depth-first walk collecting page URLs
//! - Extraction: bounded concurrent fetch of every page URL, feeding both the
//!   content extractor and the PDF link extractor
//! - Download: bounded concurrent download of the unique PDF URLs
//!
//! The page table is written between extraction and download, so a run that
//! is cancelled while downloading still saves its records.

use crate::config::Config;
use crate::crawler::downloader::{AssetDownloader, DownloadError};
use crate::crawler::extractor::extract_page;
use crate::crawler::fetcher::{build_http_client, Fetcher, HttpTransport, RetryPolicy, Transport};
use crate::crawler::parser::extract_pdf_links;
use crate::crawler::traversal::TraversalEngine;
use crate::events::{CrawlEvent, SharedObserver, TracingObserver};
use crate::output::{CrawlReport, CsvTableSink, OutputError, RecordSink};
use crate::state::{CrawlState, PageRecord};
use crate::url::{parse_base_url, AdmissionRules};
use crate::HarvestError;
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    base_url: Url,
    rules: AdmissionRules,
    transport: Arc<dyn Transport>,
    observer: SharedObserver,
    cancel: CancellationToken,
    state: Arc<CrawlState>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The base URL is unusable or the HTTP client
    ///   could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let base_url = parse_base_url(&config.crawler.base_url)?;
        let client = build_http_client(&config.fetch)?;
        let rules = AdmissionRules::from_config(&config.admission);

        Ok(Self {
            config: Arc::new(config),
            base_url,
            rules,
            transport: Arc::new(HttpTransport::new(client)),
            observer: Arc::new(TracingObserver),
            cancel: CancellationToken::new(),
            state: Arc::new(CrawlState::new()),
        })
    }

    /// Replaces the HTTP transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replaces the event observer (default: [`TracingObserver`])
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Uses an external cancellation token
    ///
    /// Cancelling it stops the run at the next fetch; collected records are
    /// still written.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle to the state of this run
    pub fn state(&self) -> Arc<CrawlState> {
        Arc::clone(&self.state)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Runs the crawl to completion
    ///
    /// Individual page and asset failures are counted in the report. The
    /// only errors are an uncreatable download folder and a failed table
    /// write; the latter is returned after the downloads finished.
    pub async fn run(self) -> Result<CrawlReport, HarvestError> {
        let mut report = CrawlReport::start();

        let folder = &self.config.output.download_folder;
        tokio::fs::create_dir_all(folder)
            .await
            .map_err(|source| HarvestError::DownloadFolder {
                path: folder.clone(),
                source,
            })?;

        // The deadline cancels a child token so the caller's token is untouched
        let run_token = self.cancel.child_token();
        let deadline = self.spawn_deadline(&run_token);

        let fetcher = Fetcher::new(
            Arc::clone(&self.transport),
            RetryPolicy::from_config(&self.config.fetch),
            Arc::clone(&self.observer),
            run_token.clone(),
        );

        // Phase 1: traversal
        let traversal = TraversalEngine::new(
            fetcher.clone(),
            self.rules.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.observer),
            self.config.crawler.max_depth,
        )
        .with_max_pages(self.config.crawler.max_pages);
        let traversal_stats = traversal.run(&self.base_url).await;

        report.pages_visited = traversal_stats.pages_visited;
        report.pages_failed = traversal_stats.pages_failed;
        report.pages_discovered = self.state.page_urls().len();
        tracing::info!(
            "Traversal finished: {} visited, {} page URLs",
            report.pages_visited,
            report.pages_discovered
        );

        // Phase 2: extraction
        let (failed, duplicates) = self.extract_pages(&fetcher, &run_token).await;
        report.pages_failed += failed;
        report.duplicates_skipped = duplicates;
        report.records_written = self.state.record_count();
        report.pdfs_discovered = self.state.pdf_urls().len();

        // Table
        let table_result = self.write_table();
        report.table_written = table_result.is_ok();

        // Phase 3: downloads
        let (downloaded, download_failures) = self.download_assets(&fetcher, &run_token).await;
        report.pdfs_downloaded = downloaded;
        report.pdf_failures = download_failures;

        if let Some(handle) = deadline {
            handle.abort();
        }

        report.cancelled = run_token.is_cancelled();
        report.finish();

        table_result?;
        Ok(report)
    }

    /// Cancels `token` once the crawl-wide deadline passes
    fn spawn_deadline(&self, token: &CancellationToken) -> Option<tokio::task::JoinHandle<()>> {
        let secs = self.config.crawler.crawl_timeout_secs;
        if secs == 0 {
            return None;
        }

        let token = token.clone();
        let limit = Duration::from_secs(secs);
        Some(tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(limit) => {
                    tracing::warn!("Crawl deadline of {}s reached, cancelling", secs);
                    token.cancel();
                }
            }
        }))
    }

    /// Fetches every page URL once and extracts its record and PDF links
    ///
    /// Returns the number of failed fetches and of duplicate pages.
    async fn extract_pages(&self, fetcher: &Fetcher, token: &CancellationToken) -> (usize, usize) {
        let page_urls = self.state.page_urls();
        let failed = AtomicUsize::new(0);
        let duplicates = AtomicUsize::new(0);
        let concurrency = self.config.crawler.concurrency.max(1) as usize;

        tracing::info!(
            "Extracting {} page(s) with concurrency {}",
            page_urls.len(),
            concurrency
        );

        stream::iter(page_urls)
            .for_each_concurrent(concurrency, |url| {
                let failed = &failed;
                let duplicates = &duplicates;

                async move {
                    if token.is_cancelled() {
                        return;
                    }

                    let html = match fetcher.fetch_text(&url).await {
                        Some(html) => html,
                        None => {
                            if !token.is_cancelled() {
                                failed.fetch_add(1, Ordering::Relaxed);
                            }
                            return;
                        }
                    };

                    let (record, pdf_links) = self.harvest_page(&url, &html);
                    match record {
                        Some(record) => self.state.push_record(record),
                        None => {
                            duplicates.fetch_add(1, Ordering::Relaxed);
                        }
                    }

                    if !pdf_links.is_empty() {
                        self.observer.on_event(&CrawlEvent::PdfLinksFound {
                            url: url.clone(),
                            count: pdf_links.len(),
                        });
                    }
                    for link in &pdf_links {
                        self.state.insert_pdf_url(link);
                    }
                }
            })
            .await;

        if token.is_cancelled() {
            self.observer
                .on_event(&CrawlEvent::Cancelled { phase: "extraction" });
        }

        (failed.into_inner(), duplicates.into_inner())
    }

    /// Parses a page once for its record and its PDF links
    ///
    /// PDF hrefs resolve against the crawl base URL, not the page URL.
    fn harvest_page(&self, url: &str, html: &str) -> (Option<PageRecord>, Vec<String>) {
        let document = Html::parse_document(html);
        let record = extract_page(
            url,
            html,
            &document,
            &self.state,
            self.config.crawler.fingerprint,
            &*self.observer,
        );
        let pdf_links = extract_pdf_links(&document, &self.base_url, &self.rules);
        (record, pdf_links)
    }

    /// Downloads every unique PDF URL
    ///
    /// Returns the number of written files and of failed downloads.
    async fn download_assets(&self, fetcher: &Fetcher, token: &CancellationToken) -> (usize, usize) {
        let pdf_urls = self.state.pdf_urls();
        let downloader = AssetDownloader::new(
            fetcher.clone(),
            &self.config.output.download_folder,
            self.config.output.asset_naming,
            Arc::clone(&self.observer),
        );
        let downloaded = AtomicUsize::new(0);
        let failures = AtomicUsize::new(0);
        let concurrency = self.config.crawler.concurrency.max(1) as usize;

        tracing::info!("Downloading {} PDF document(s)", pdf_urls.len());

        stream::iter(pdf_urls)
            .for_each_concurrent(concurrency, |url| {
                let downloader = &downloader;
                let downloaded = &downloaded;
                let failures = &failures;

                async move {
                    if token.is_cancelled() {
                        return;
                    }
                    match downloader.download(&url).await {
                        Ok(_) => {
                            downloaded.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(DownloadError::Cancelled) => {}
                        Err(_) => {
                            failures.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
            .await;

        if token.is_cancelled() {
            self.observer
                .on_event(&CrawlEvent::Cancelled { phase: "download" });
        }

        (downloaded.into_inner(), failures.into_inner())
    }

    fn write_table(&self) -> Result<usize, OutputError> {
        let path = Path::new(&self.config.output.table_path);
        let records = self.state.records();

        match CsvTableSink.save(&records, path) {
            Ok(rows) => {
                self.observer.on_event(&CrawlEvent::TableWritten {
                    path: path.to_path_buf(),
                    rows,
                });
                Ok(rows)
            }
            Err(e) => {
                self.observer.on_event(&CrawlEvent::TableFailed {
                    path: path.to_path_buf(),
                    cause: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

/// Runs a complete crawl with the default HTTP transport
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed (possibly with per-page failures)
/// * `Err(HarvestError)` - Crawl could not start or the table was not written
pub async fn run_crawl(config: Config) -> Result<CrawlReport, HarvestError> {
    Coordinator::new(config)?.run().await
}
