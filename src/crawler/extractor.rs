//! Page content extraction
//!
//! Turns a fetched HTML body into a [`PageRecord`]: title, flattened meta
//! tags and visible text. Pages whose fingerprint was already registered in
//! the crawl state are reported as duplicates and produce no record.

use crate::config::FingerprintMode;
use crate::events::{CrawlEvent, CrawlObserver};
use crate::state::{CrawlState, Fingerprint, PageRecord};
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};

/// Title used when a page has no usable `<title>`
pub const DEFAULT_TITLE: &str = "No Title";

/// Elements whose text is never part of the visible contents
///
/// `noscript` bodies are parsed as raw markup, so they are skipped too.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// SHA-256 digest of arbitrary bytes
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    Sha256::digest(bytes).into()
}

/// Extracts one page record, unless its content was seen before
///
/// `document` is the parse of `html`. The fingerprint is registered in
/// `state` as part of the check, so of several concurrent calls with
/// identical content exactly one returns a record. In raw-HTML mode the
/// check runs before any extraction work.
pub fn extract_page(
    url: &str,
    html: &str,
    document: &Html,
    state: &CrawlState,
    mode: FingerprintMode,
    observer: &dyn CrawlObserver,
) -> Option<PageRecord> {
    let contents = match mode {
        FingerprintMode::RawHtml => {
            claim_fingerprint(url, fingerprint(html.as_bytes()), state, observer)?;
            visible_text(document)
        }
        FingerprintMode::VisibleText => {
            let contents = visible_text(document);
            claim_fingerprint(url, fingerprint(contents.as_bytes()), state, observer)?;
            contents
        }
    };

    let record = PageRecord {
        url: url.to_string(),
        title: page_title(document),
        metadata: flatten_metadata(document),
        contents,
    };

    observer.on_event(&CrawlEvent::PageExtracted {
        url: record.url.clone(),
        title: record.title.clone(),
    });

    Some(record)
}

/// Registers `digest`, or reports `url` as a duplicate
fn claim_fingerprint(
    url: &str,
    digest: Fingerprint,
    state: &CrawlState,
    observer: &dyn CrawlObserver,
) -> Option<()> {
    if state.register_fingerprint(digest) {
        return Some(());
    }

    tracing::debug!("Fingerprint {} already registered", hex::encode(digest));
    observer.on_event(&CrawlEvent::DuplicateContent {
        url: url.to_string(),
    });
    None
}

/// Text of the first `<title>`, or [`DEFAULT_TITLE`]
fn page_title(document: &Html) -> String {
    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

/// Meta tags as `key: value` pairs joined by `; `
///
/// The key is the `name` attribute, else `property`, else `unknown`. A
/// repeated key takes the later value but keeps its first position.
fn flatten_metadata(document: &Html) -> String {
    let selector = match Selector::parse("meta") {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    let mut entries: Vec<(String, String)> = Vec::new();

    for element in document.select(&selector) {
        let attrs = element.value();
        let key = attrs
            .attr("name")
            .or_else(|| attrs.attr("property"))
            .unwrap_or("unknown");
        let value = attrs.attr("content").unwrap_or("");

        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
    }

    entries
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Visible text, one trimmed non-empty text node per line
fn visible_text(document: &Html) -> String {
    let root = document.root_element();
    let mut lines = Vec::new();

    for node in root.descendants() {
        let text = match node.value().as_text() {
            Some(t) => t,
            None => continue,
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingObserver;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title> Tuyển sinh 2024 </title>
    <meta charset="utf-8">
    <meta name="description" content="Thông tin tuyển sinh">
    <meta property="og:title" content="UEL">
    <meta name="description" content="Updated">
    <style>body { color: red; }</style>
    <script>var hidden = 1;</script>
</head>
<body>
    <h1>Chào mừng</h1>
    <p>  Học phí   </p>
    <script>console.log("no");</script>
    <noscript>Enable JS</noscript>
    <p>   </p>
    <div>Liên hệ <b>phòng đào tạo</b></div>
</body>
</html>"#;

    fn extract_as(
        url: &str,
        html: &str,
        state: &CrawlState,
        mode: FingerprintMode,
        observer: &RecordingObserver,
    ) -> Option<PageRecord> {
        let document = Html::parse_document(html);
        extract_page(url, html, &document, state, mode, observer)
    }

    fn extract(html: &str, state: &CrawlState) -> Option<PageRecord> {
        extract_as(
            "https://uel.edu.vn/a",
            html,
            state,
            FingerprintMode::RawHtml,
            &RecordingObserver::new(),
        )
    }

    #[test]
    fn test_extract_record_fields() {
        let state = CrawlState::new();
        let record = extract(PAGE, &state).unwrap();

        assert_eq!(record.url, "https://uel.edu.vn/a");
        assert_eq!(record.title, "Tuyển sinh 2024");
        assert_eq!(
            record.metadata,
            "unknown: ; description: Updated; og:title: UEL"
        );
        assert_eq!(
            record.contents,
            "Tuyển sinh 2024\nChào mừng\nHọc phí\nLiên hệ\nphòng đào tạo"
        );
    }

    #[test]
    fn test_missing_title_uses_default() {
        let state = CrawlState::new();
        let record = extract("<html><body><p>x</p></body></html>", &state).unwrap();
        assert_eq!(record.title, DEFAULT_TITLE);

        let record = extract("<html><head><title>  </title></head></html>", &state).unwrap();
        assert_eq!(record.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_no_meta_tags_gives_empty_metadata() {
        let state = CrawlState::new();
        let record = extract("<html><body>x</body></html>", &state).unwrap();
        assert_eq!(record.metadata, "");
    }

    #[test]
    fn test_identical_body_is_duplicate() {
        let state = CrawlState::new();
        let observer = RecordingObserver::new();

        let first = extract_as(
            "https://uel.edu.vn/a",
            PAGE,
            &state,
            FingerprintMode::RawHtml,
            &observer,
        );
        let second = extract_as(
            "https://uel.edu.vn/b",
            PAGE,
            &state,
            FingerprintMode::RawHtml,
            &observer,
        );

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(
            observer.count(|e| matches!(e, CrawlEvent::DuplicateContent { url } if url == "https://uel.edu.vn/b")),
            1
        );
        assert_eq!(
            observer.count(|e| matches!(e, CrawlEvent::PageExtracted { .. })),
            1
        );
    }

    #[test]
    fn test_one_byte_difference_is_not_duplicate() {
        let state = CrawlState::new();
        let other = PAGE.replace("Học phí", "Học phi");

        assert!(extract(PAGE, &state).is_some());
        assert!(extract(&other, &state).is_some());
        assert_eq!(state.fingerprint_count(), 2);
    }

    #[test]
    fn test_visible_text_mode_ignores_markup_changes() {
        let state = CrawlState::new();
        let observer = RecordingObserver::new();
        let a = "<html><body><p>Same text</p><!-- build 1 --></body></html>";
        let b = "<html><body><div>Same text</div><!-- build 2 --></body></html>";

        let first = extract_as("u1", a, &state, FingerprintMode::VisibleText, &observer);
        let second = extract_as("u2", b, &state, FingerprintMode::VisibleText, &observer);

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[test]
    fn test_raw_fingerprint_comes_from_bytes_not_parse() {
        let state = CrawlState::new();
        let observer = RecordingObserver::new();
        assert!(extract(PAGE, &state).is_some());

        let other = Html::parse_document("<html><head><title>Other</title></head></html>");
        let duplicate = extract_page(
            "https://uel.edu.vn/b",
            PAGE,
            &other,
            &state,
            FingerprintMode::RawHtml,
            &observer,
        );

        assert!(duplicate.is_none());
        assert_eq!(state.fingerprint_count(), 1);
        assert_eq!(
            observer.count(|e| matches!(e, CrawlEvent::PageExtracted { .. })),
            0
        );
    }

    #[test]
    fn test_contents_start_with_title_text() {
        let state = CrawlState::new();
        let html = "<html><head><title>Lịch thi</title></head><body><p>Phòng A1</p><noscript><img src=x></noscript></body></html>";
        let record = extract(html, &state).unwrap();
        assert_eq!(record.contents, "Lịch thi\nPhòng A1");
    }

    #[test]
    fn test_fingerprint_is_sha256() {
        assert_eq!(
            hex::encode(fingerprint(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
    }
}
