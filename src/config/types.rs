use serde::{Deserialize, Serialize};

/// Main configuration structure for Site-Harvester
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    pub output: OutputConfig,
}

/// Traversal and fan-out configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// URL the traversal starts from
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum recursion depth from the base URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Cap on the number of pages fetched during traversal (0 = unlimited)
    #[serde(rename = "max-pages", default)]
    pub max_pages: u32,

    /// Maximum number of simultaneous fetches in the extraction and download phases
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Crawl-wide deadline in seconds (0 = no deadline)
    #[serde(rename = "crawl-timeout-secs", default)]
    pub crawl_timeout_secs: u64,

    /// What the content fingerprint is computed over
    #[serde(default)]
    pub fingerprint: FingerprintMode,
}

/// Source of the content fingerprint used for deduplication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FingerprintMode {
    /// Digest of the full decoded HTML, navigation chrome included
    #[default]
    RawHtml,
    /// Digest of the extracted visible text only
    VisibleText,
}

/// Network behavior of the fetcher
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Number of attempts per URL (at least 1)
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between failed attempts (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-attempt timeout for HTML pages
    #[serde(rename = "text-timeout-secs", default = "default_text_timeout")]
    pub text_timeout_secs: u64,

    /// Per-attempt timeout for binary assets
    #[serde(rename = "binary-timeout-secs", default = "default_binary_timeout")]
    pub binary_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            delay_ms: default_delay_ms(),
            text_timeout_secs: default_text_timeout(),
            binary_timeout_secs: default_binary_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Link admissibility rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdmissionConfig {
    /// Hrefs containing any of these substrings are rejected
    #[serde(rename = "excluded-substrings", default = "default_excluded_substrings")]
    pub excluded_substrings: Vec<String>,

    /// Hrefs ending with any of these extensions are rejected
    #[serde(rename = "excluded-extensions", default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,

    /// Token an href must contain to count as in-domain
    #[serde(rename = "domain-marker")]
    pub domain_marker: String,

    /// Prefix an href must start with (secure scheme)
    #[serde(rename = "required-prefix", default = "default_required_prefix")]
    pub required_prefix: String,

    /// Suffix identifying PDF asset links
    #[serde(rename = "pdf-suffix", default = "default_pdf_suffix")]
    pub pdf_suffix: String,

    /// Match the PDF suffix ignoring ASCII case
    #[serde(rename = "pdf-case-insensitive", default)]
    pub pdf_case_insensitive: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            excluded_substrings: default_excluded_substrings(),
            excluded_extensions: default_excluded_extensions(),
            domain_marker: "uel".to_string(),
            required_prefix: default_required_prefix(),
            pdf_suffix: default_pdf_suffix(),
            pdf_case_insensitive: false,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Path of the CSV page table
    #[serde(rename = "table-path")]
    pub table_path: String,

    /// Directory that receives downloaded PDFs
    #[serde(rename = "download-folder")]
    pub download_folder: String,

    /// How downloaded files are named
    #[serde(rename = "asset-naming", default)]
    pub asset_naming: AssetNaming,
}

/// Naming scheme for downloaded assets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetNaming {
    /// Last path segment of the source URL; same basenames overwrite each other
    #[default]
    Basename,
    /// SHA-256 of the downloaded bytes
    ContentHash,
}

fn default_concurrency() -> u32 {
    16
}

fn default_retries() -> u32 {
    3
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_text_timeout() -> u64 {
    10
}

fn default_binary_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("site-harvester/{}", env!("CARGO_PKG_VERSION"))
}

fn default_excluded_substrings() -> Vec<String> {
    ["facebook", "linkedin", "zalo", "tiktok", "google"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excluded_extensions() -> Vec<String> {
    [".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm", ".mkv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_required_prefix() -> String {
    "https".to_string()
}

fn default_pdf_suffix() -> String {
    ".pdf".to_string()
}
