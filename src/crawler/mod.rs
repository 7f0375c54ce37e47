//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and charset decoding
//! - HTML parsing and link extraction
//! - Page content extraction and deduplication
//! - Depth-first traversal
//! - PDF downloads
//! - Overall crawl coordination

mod coordinator;
mod downloader;
mod extractor;
mod fetcher;
mod parser;
mod traversal;

pub use coordinator::{run_crawl, Coordinator};
pub use downloader::{asset_file_name, AssetDownloader, DownloadError};
pub use extractor::{extract_page, fingerprint, DEFAULT_TITLE};
pub use fetcher::{
    build_http_client, decode_body, Body, DecodedText, FetchError, Fetcher, HttpTransport,
    RetryPolicy, Transport,
};
pub use parser::{extract_page_links, extract_pdf_links};
pub use traversal::{TraversalEngine, TraversalStats};
