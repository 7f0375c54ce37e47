//! URL handling module for Site-Harvester
//!
//! This module provides base URL parsing, href resolution, asset file naming,
//! and the admissibility rules that decide which links the crawler follows.

mod admission;
mod resolve;

// Re-export main functions
pub use admission::AdmissionRules;
pub use resolve::{parse_base_url, resolve_link, url_basename};
