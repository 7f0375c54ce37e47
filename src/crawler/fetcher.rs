//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - GET requests with a per-attempt timeout
//! - Retry with a fixed delay for transient failures
//! - Charset detection and lossy decoding of HTML bodies
//! - Error classification
//!
//! The fetcher knows nothing about crawl state. Exhausted retries are not an
//! error for the caller: they come back as `None`, after the cause has been
//! reported to the observer.

use crate::config::FetchConfig;
use crate::events::{CrawlEvent, SharedObserver};
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Failure of a single fetch attempt
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Returns true if another attempt might succeed
    ///
    /// | Condition | Retried |
    /// |-----------|---------|
    /// | Timeout | yes |
    /// | Connection error | yes |
    /// | Body read / other transport error | yes |
    /// | HTTP 429 and 5xx | yes |
    /// | Other HTTP 4xx | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) | Self::Other(_) => true,
            Self::Status(code) => *code == 429 || *code >= 500,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Other(e.to_string())
        }
    }
}

/// Raw response body of a successful GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub bytes: Vec<u8>,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
}

/// One GET request, with no retry logic of its own
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Body, FetchError>;
}

/// Transport backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Body, FetchError> {
        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await?;

        Ok(Body {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_harvester::config::FetchConfig;
/// use site_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Attempt count, pause, and per-attempt timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per URL, at least 1
    pub retries: u32,
    /// Pause between failed attempts
    pub delay: Duration,
    /// Per-attempt timeout for HTML
    pub text_timeout: Duration,
    /// Per-attempt timeout for binaries
    pub binary_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            retries: config.retries.max(1),
            delay: Duration::from_millis(config.delay_ms),
            text_timeout: Duration::from_secs(config.text_timeout_secs),
            binary_timeout: Duration::from_secs(config.binary_timeout_secs),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Retrying fetcher shared by every crawl phase
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    observer: SharedObserver,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
        observer: SharedObserver,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            policy,
            observer,
            cancel,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fetches a page and decodes it to text
    ///
    /// # Returns
    ///
    /// * `Some(String)` - The decoded body
    /// * `None` - Every attempt failed, a non-retryable status was returned,
    ///   or the crawl was cancelled
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let body = self.fetch_with_retries(url, self.policy.text_timeout).await?;
        let decoded = decode_body(&body.bytes, body.content_type.as_deref());

        if decoded.used_fallback {
            self.observer.on_event(&CrawlEvent::DecodingFallback {
                url: url.to_string(),
                encoding: decoded.encoding.name(),
            });
        }

        Some(decoded.text)
    }

    /// Fetches a binary asset
    pub async fn fetch_binary(&self, url: &str) -> Option<Vec<u8>> {
        self.fetch_with_retries(url, self.policy.binary_timeout)
            .await
            .map(|body| body.bytes)
    }

    async fn fetch_with_retries(&self, url: &str, timeout: Duration) -> Option<Body> {
        let max_attempts = self.policy.retries.max(1);

        for attempt in 1..=max_attempts {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                result = self.transport.get(url, timeout) => result,
            };

            let error = match result {
                Ok(body) => return Some(body),
                Err(e) => e,
            };

            if !error.is_transient() || attempt == max_attempts {
                self.observer.on_event(&CrawlEvent::FetchFailed {
                    url: url.to_string(),
                    attempts: attempt,
                    cause: error.to_string(),
                });
                return None;
            }

            self.observer.on_event(&CrawlEvent::FetchRetry {
                url: url.to_string(),
                attempt,
                max_attempts,
                delay: self.policy.delay,
                cause: error.to_string(),
            });

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.policy.delay) => {}
            }
        }

        None
    }
}

/// Text decoded from a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// True when detection was inconclusive and the fallback charset was used
    pub used_fallback: bool,
}

/// Decodes a body to text without ever failing
///
/// Encoding is chosen in this order: byte-order mark, `charset` parameter of
/// the Content-Type header, a confident `chardetng` guess, UTF-8 if the bytes
/// are valid UTF-8, and finally windows-1252 (the WHATWG meaning of
/// ISO-8859-1). Undecodable sequences become U+FFFD.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> DecodedText {
    let (encoding, used_fallback) = detect_encoding(bytes, content_type);
    let (text, _, _) = encoding.decode(bytes);

    DecodedText {
        text: text.into_owned(),
        encoding,
        used_fallback,
    }
}

fn detect_encoding(bytes: &[u8], content_type: Option<&str>) -> (&'static Encoding, bool) {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return (encoding, false);
    }

    if let Some(encoding) = content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return (encoding, false);
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let (guess, confident) = detector.guess_assess(None, true);
    if confident {
        return (guess, false);
    }

    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, false);
    }

    (WINDOWS_1252, true)
}

/// Extracts the `charset` parameter from a Content-Type value
fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}
