//! State module for tracking crawl progress
//!
//! This module provides the state owned by one crawl run.
//!
//! # Components
//!
//! - `CrawlState`: Visited URLs, content fingerprints, discovered page and PDF URLs, and page records
//! - `PageRecord`: One extracted page, as written to the output table
//! - `TraversalOutcome`: How the traversal engine disposed of an offered URL

mod crawl_state;
mod traversal_outcome;

// Re-export main types
pub use crawl_state::{CrawlState, Fingerprint, PageRecord};
pub use traversal_outcome::TraversalOutcome;
