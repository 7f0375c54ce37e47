//! Depth-bounded site traversal
//!
//! Walks the site depth-first from the base URL. Each page is fetched once,
//! its admissible links are listed in `page_urls` in discovery order, and
//! every unvisited link within the depth bound is expanded before its next
//! sibling. The walk keeps an explicit stack of frames instead of recursing.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::extract_page_links;
use crate::events::{CrawlEvent, SharedObserver};
use crate::state::{CrawlState, TraversalOutcome};
use crate::url::AdmissionRules;
use std::sync::Arc;
use url::Url;

/// Counters of one traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Pages marked visited (fetched or attempted)
    pub pages_visited: usize,

    /// Visited pages whose fetch produced no content
    pub pages_failed: usize,

    /// The `max-pages` cap stopped the walk
    pub limit_reached: bool,

    /// The cancellation token stopped the walk
    pub cancelled: bool,
}

/// One expanded page whose links are still being walked
struct Frame {
    depth: u32,
    links: std::vec::IntoIter<String>,
}

/// Depth-first traversal engine
pub struct TraversalEngine {
    fetcher: Fetcher,
    rules: AdmissionRules,
    state: Arc<CrawlState>,
    observer: SharedObserver,
    max_depth: u32,
    max_pages: u32,
}

impl TraversalEngine {
    pub fn new(
        fetcher: Fetcher,
        rules: AdmissionRules,
        state: Arc<CrawlState>,
        observer: SharedObserver,
        max_depth: u32,
    ) -> Self {
        Self {
            fetcher,
            rules,
            state,
            observer,
            max_depth,
            max_pages: 0,
        }
    }

    /// Caps the number of visited pages (0 = unlimited)
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Walks the site from `base_url`
    ///
    /// The base URL is visited at depth 0 but is not itself listed in
    /// `page_urls`. Failures never abort the walk.
    pub async fn run(&self, base_url: &Url) -> TraversalStats {
        let mut stats = TraversalStats::default();

        self.observer.on_event(&CrawlEvent::TraversalStarted {
            base_url: base_url.to_string(),
            max_depth: self.max_depth,
        });

        let mut stack: Vec<Frame> = Vec::new();
        if let Some(links) = self.visit(base_url.as_str(), 0, &mut stats).await {
            stack.push(Frame {
                depth: 0,
                links: links.into_iter(),
            });
        }

        while let Some(frame) = stack.last_mut() {
            if stats.cancelled || stats.limit_reached {
                break;
            }

            let link = match frame.links.next() {
                Some(link) => link,
                None => {
                    stack.pop();
                    continue;
                }
            };
            let depth = frame.depth + 1;

            if self.state.is_visited(&link) {
                self.report(&link, depth, TraversalOutcome::SkippedVisited, 0);
                continue;
            }
            if depth > self.max_depth {
                self.report(&link, depth, TraversalOutcome::SkippedDepth, 0);
                continue;
            }
            if self.limit_reached() {
                self.report(&link, depth, TraversalOutcome::SkippedLimit, 0);
                stats.limit_reached = true;
                break;
            }

            self.state.push_page_url(&link);

            if let Some(links) = self.visit(&link, depth, &mut stats).await {
                stack.push(Frame {
                    depth,
                    links: links.into_iter(),
                });
            }
        }

        if stats.cancelled {
            self.observer.on_event(&CrawlEvent::Cancelled { phase: "traversal" });
        }

        stats
    }

    /// Visits one URL, returning its admissible links if it was expanded
    async fn visit(
        &self,
        url: &str,
        depth: u32,
        stats: &mut TraversalStats,
    ) -> Option<Vec<String>> {
        if self.fetcher.is_cancelled() {
            stats.cancelled = true;
            self.report(url, depth, TraversalOutcome::Cancelled, 0);
            return None;
        }
        if depth > self.max_depth {
            self.report(url, depth, TraversalOutcome::SkippedDepth, 0);
            return None;
        }
        if self.limit_reached() {
            stats.limit_reached = true;
            self.report(url, depth, TraversalOutcome::SkippedLimit, 0);
            return None;
        }
        if !self.state.mark_visited(url) {
            self.report(url, depth, TraversalOutcome::SkippedVisited, 0);
            return None;
        }
        stats.pages_visited += 1;

        let html = match self.fetcher.fetch_text(url).await {
            Some(html) => html,
            None if self.fetcher.is_cancelled() => {
                stats.cancelled = true;
                self.report(url, depth, TraversalOutcome::Cancelled, 0);
                return None;
            }
            None => {
                stats.pages_failed += 1;
                self.report(url, depth, TraversalOutcome::SkippedEmpty, 0);
                return None;
            }
        };

        let page_url = Url::parse(url).ok()?;
        let links = extract_page_links(&html, &page_url, &self.rules);
        self.report(url, depth, TraversalOutcome::Expanded, links.len());

        Some(links)
    }

    fn limit_reached(&self) -> bool {
        self.max_pages > 0 && self.state.visited_count() >= self.max_pages as usize
    }

    fn report(&self, url: &str, depth: u32, outcome: TraversalOutcome, links_found: usize) {
        tracing::trace!("{} {} (depth {})", outcome, url, depth);
        self.observer.on_event(&CrawlEvent::Traversal {
            url: url.to_string(),
            depth,
            outcome,
            links_found,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{Body, FetchError, RetryPolicy, Transport};
    use crate::events::RecordingObserver;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Serves fixed pages and records every requested URL
    #[derive(Default)]
    struct SiteTransport {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl SiteTransport {
        fn with_pages(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for SiteTransport {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<Body, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(html) => Ok(Body {
                    bytes: html.as_bytes().to_vec(),
                    content_type: Some("text/html; charset=utf-8".to_string()),
                }),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    fn links(hrefs: &[&str]) -> String {
        hrefs
            .iter()
            .map(|h| format!(r#"<a href="{}">x</a>"#, h))
            .collect()
    }

    struct Harness {
        transport: Arc<SiteTransport>,
        observer: Arc<RecordingObserver>,
        state: Arc<CrawlState>,
        cancel: CancellationToken,
    }

    impl Harness {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                transport: Arc::new(SiteTransport::with_pages(pages)),
                observer: Arc::new(RecordingObserver::new()),
                state: Arc::new(CrawlState::new()),
                cancel: CancellationToken::new(),
            }
        }

        fn engine(&self, max_depth: u32) -> TraversalEngine {
            let policy = RetryPolicy {
                retries: 1,
                delay: Duration::ZERO,
                ..RetryPolicy::default()
            };
            let fetcher = Fetcher::new(
                self.transport.clone(),
                policy,
                self.observer.clone(),
                self.cancel.clone(),
            );
            TraversalEngine::new(
                fetcher,
                AdmissionRules::default(),
                self.state.clone(),
                self.observer.clone(),
                max_depth,
            )
        }
    }

    fn base() -> Url {
        Url::parse("https://uel.edu.vn/").unwrap()
    }

    fn site() -> Vec<(&'static str, String)> {
        vec![
            (
                "https://uel.edu.vn/",
                links(&[
                    "https://uel.edu.vn/a",
                    "https://uel.edu.vn/b",
                    "https://facebook.com/uel",
                ]),
            ),
            ("https://uel.edu.vn/a", links(&["https://uel.edu.vn/c"])),
            ("https://uel.edu.vn/b", links(&["https://uel.edu.vn/a"])),
            ("https://uel.edu.vn/c", "<p>leaf</p>".to_string()),
        ]
    }

    fn pages<'a>(site: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
        site.iter().map(|(u, h)| (*u, h.as_str())).collect()
    }

    #[tokio::test]
    async fn test_depth_one_lists_direct_links_only() {
        let site = site();
        let harness = Harness::new(&pages(&site));

        let stats = harness.engine(1).run(&base()).await;

        assert_eq!(
            harness.state.page_urls(),
            vec![
                "https://uel.edu.vn/a".to_string(),
                "https://uel.edu.vn/b".to_string()
            ]
        );
        let requests = harness.transport.requests();
        assert!(!requests.contains(&"https://uel.edu.vn/c".to_string()));
        assert!(!requests.iter().any(|u| u.contains("facebook")));
        assert_eq!(stats.pages_visited, 3);
        assert!(!stats.cancelled);
    }

    #[tokio::test]
    async fn test_preorder_expansion() {
        let site = site();
        let harness = Harness::new(&pages(&site));

        harness.engine(3).run(&base()).await;

        assert_eq!(
            harness.transport.requests(),
            vec![
                "https://uel.edu.vn/".to_string(),
                "https://uel.edu.vn/a".to_string(),
                "https://uel.edu.vn/c".to_string(),
                "https://uel.edu.vn/b".to_string()
            ]
        );
        assert_eq!(
            harness.state.page_urls(),
            vec![
                "https://uel.edu.vn/a".to_string(),
                "https://uel.edu.vn/c".to_string(),
                "https://uel.edu.vn/b".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_each_url_fetched_at_most_once() {
        let site = vec![
            (
                "https://uel.edu.vn/",
                links(&["https://uel.edu.vn/a", "https://uel.edu.vn/a"]),
            ),
            (
                "https://uel.edu.vn/a",
                links(&["https://uel.edu.vn/", "https://uel.edu.vn/a"]),
            ),
        ];
        let harness = Harness::new(&pages(&site));

        harness.engine(5).run(&base()).await;

        let requests = harness.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(harness.state.page_urls(), vec!["https://uel.edu.vn/a".to_string()]);
        assert_eq!(harness.state.visited_count(), 2);
    }

    #[tokio::test]
    async fn test_max_depth_zero_visits_base_only() {
        let site = site();
        let harness = Harness::new(&pages(&site));

        let stats = harness.engine(0).run(&base()).await;

        assert_eq!(harness.transport.requests(), vec!["https://uel.edu.vn/".to_string()]);
        assert!(harness.state.page_urls().is_empty());
        assert_eq!(stats.pages_visited, 1);
        assert_eq!(
            harness.observer.count(|e| matches!(
                e,
                CrawlEvent::Traversal { outcome: TraversalOutcome::SkippedDepth, .. }
            )),
            2
        );
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped_empty() {
        let site = vec![(
            "https://uel.edu.vn/",
            links(&["https://uel.edu.vn/missing", "https://uel.edu.vn/x"]),
        )];
        let harness = Harness::new(&pages(&site));

        let stats = harness.engine(2).run(&base()).await;

        assert_eq!(stats.pages_failed, 2);
        assert_eq!(stats.pages_visited, 3);
        assert_eq!(harness.state.page_urls().len(), 2);
        assert_eq!(
            harness.observer.count(|e| matches!(
                e,
                CrawlEvent::Traversal { outcome: TraversalOutcome::SkippedEmpty, .. }
            )),
            2
        );
    }

    #[tokio::test]
    async fn test_unreachable_base_ends_walk() {
        let harness = Harness::new(&[]);

        let stats = harness.engine(3).run(&base()).await;

        assert_eq!(stats.pages_visited, 1);
        assert_eq!(stats.pages_failed, 1);
        assert!(harness.state.page_urls().is_empty());
    }

    #[tokio::test]
    async fn test_max_pages_caps_visits() {
        let site = site();
        let harness = Harness::new(&pages(&site));

        let stats = harness.engine(3).with_max_pages(2).run(&base()).await;

        assert!(stats.limit_reached);
        assert_eq!(harness.state.visited_count(), 2);
        assert_eq!(harness.transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let site = site();
        let harness = Harness::new(&pages(&site));
        harness.cancel.cancel();

        let stats = harness.engine(3).run(&base()).await;

        assert!(stats.cancelled);
        assert!(harness.transport.requests().is_empty());
        assert_eq!(
            harness.observer.count(|e| matches!(e, CrawlEvent::Cancelled { phase: "traversal" })),
            1
        );
    }
}
