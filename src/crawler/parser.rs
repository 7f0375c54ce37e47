//! HTML link extraction
//!
//! This module extracts from HTML content:
//! - Page links the traversal may follow (admissibility-filtered)
//! - PDF asset links
//!
//! Only `<a href>` anchors are considered. Filtering looks at the raw href;
//! the returned URLs are resolved against the given base URL. Nothing is
//! retained between calls.

use crate::url::{resolve_link, AdmissionRules};
use scraper::{Html, Selector};
use url::Url;

/// Extracts the admissible page links of a document
pub fn extract_page_links(html: &str, base_url: &Url, rules: &AdmissionRules) -> Vec<String> {
    let document = Html::parse_document(html);
    filter_and_resolve(&collect_hrefs(&document), base_url, |href| {
        rules.is_admissible(href)
    })
}

/// Extracts the PDF links of an already parsed document
///
/// No filter other than the PDF suffix applies. The caller owns the parse so
/// one document can feed both this and the content extractor.
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use site_harvester::crawler::extract_pdf_links;
/// use site_harvester::url::AdmissionRules;
/// use url::Url;
///
/// let document = Html::parse_document(r#"<a href="files/doc1.pdf">PDF</a>"#);
/// let base = Url::parse("https://uel.edu.vn/").unwrap();
/// let pdfs = extract_pdf_links(&document, &base, &AdmissionRules::default());
/// assert_eq!(pdfs, vec!["https://uel.edu.vn/files/doc1.pdf"]);
/// ```
pub fn extract_pdf_links(document: &Html, base_url: &Url, rules: &AdmissionRules) -> Vec<String> {
    filter_and_resolve(&collect_hrefs(document), base_url, |href| rules.is_pdf(href))
}

/// Collects the raw href of every anchor
fn collect_hrefs(document: &Html) -> Vec<String> {
    let mut hrefs = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href.to_string());
            }
        }
    }

    hrefs
}

fn filter_and_resolve<F>(hrefs: &[String], base_url: &Url, accept: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    hrefs
        .iter()
        .filter(|href| accept(href.as_str()))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://uel.edu.vn").unwrap()
    }

    fn pdf_links_of(html: &str, base: &Url, rules: &AdmissionRules) -> Vec<String> {
        extract_pdf_links(&Html::parse_document(html), base, rules)
    }

    fn anchors(hrefs: &[&str]) -> String {
        let body: String = hrefs
            .iter()
            .map(|h| format!(r#"<a href="{}">link</a>"#, h))
            .collect();
        format!("<html><body>{}</body></html>", body)
    }

    #[test]
    fn test_admissibility_filter() {
        let html = anchors(&[
            "https://uel.edu.vn/a",
            "https://facebook.com/uel",
            "https://uel.edu.vn/video.mp4",
            "http://uel.edu.vn/b",
        ]);

        let links = extract_page_links(&html, &base_url(), &AdmissionRules::default());
        assert_eq!(links, vec!["https://uel.edu.vn/a".to_string()]);
    }

    #[test]
    fn test_pdf_extraction_exact_suffix() {
        let html = anchors(&["doc1.pdf", "page.html", "sub/doc2.PDF"]);
        let base = Url::parse("https://x.test/").unwrap();

        let pdfs = pdf_links_of(&html, &base, &AdmissionRules::default());
        assert_eq!(pdfs, vec!["https://x.test/doc1.pdf".to_string()]);
    }

    #[test]
    fn test_pdf_extraction_case_insensitive() {
        let html = anchors(&["doc1.pdf", "page.html", "sub/doc2.PDF"]);
        let base = Url::parse("https://x.test/").unwrap();
        let mut rules = AdmissionRules::default();
        rules.pdf_case_insensitive = true;

        let pdfs = pdf_links_of(&html, &base, &rules);
        assert_eq!(
            pdfs,
            vec![
                "https://x.test/doc1.pdf".to_string(),
                "https://x.test/sub/doc2.PDF".to_string()
            ]
        );
    }

    #[test]
    fn test_pdf_links_are_not_admission_filtered() {
        let html = anchors(&["https://drive.google.com/file.pdf", "http://other.org/x.pdf"]);
        let pdfs = pdf_links_of(&html, &base_url(), &AdmissionRules::default());
        assert_eq!(pdfs.len(), 2);
    }

    #[test]
    fn test_relative_pdf_resolves_against_given_base() {
        let html = anchors(&["files/de-an.pdf", "../up.pdf"]);
        let base = Url::parse("https://uel.edu.vn/").unwrap();
        let page = Url::parse("https://uel.edu.vn/news/2024/post").unwrap();

        assert_eq!(
            pdf_links_of(&html, &base, &AdmissionRules::default()),
            vec![
                "https://uel.edu.vn/files/de-an.pdf".to_string(),
                "https://uel.edu.vn/up.pdf".to_string()
            ]
        );
        assert_eq!(
            pdf_links_of(&html, &page, &AdmissionRules::default()),
            vec![
                "https://uel.edu.vn/news/2024/files/de-an.pdf".to_string(),
                "https://uel.edu.vn/news/up.pdf".to_string()
            ]
        );
    }

    #[test]
    fn test_anchors_without_href_are_ignored() {
        let html = r#"<html><body><a name="top">Top</a><a href="https://uel.edu.vn/x">X</a></body></html>"#;
        let links = extract_page_links(html, &base_url(), &AdmissionRules::default());
        assert_eq!(links, vec!["https://uel.edu.vn/x".to_string()]);
    }

    #[test]
    fn test_non_anchor_links_are_ignored() {
        let html = r#"<html><head><link rel="canonical" href="https://uel.edu.vn/c"></head>
            <body><img src="https://uel.edu.vn/i.png"></body></html>"#;
        let rules = AdmissionRules::default();
        assert!(extract_page_links(html, &base_url(), &rules).is_empty());
        assert!(pdf_links_of(html, &base_url(), &rules).is_empty());
    }

    #[test]
    fn test_document_order_and_duplicates_kept() {
        let html = anchors(&[
            "https://uel.edu.vn/b",
            "https://uel.edu.vn/a",
            "https://uel.edu.vn/b",
        ]);
        let links = extract_page_links(&html, &base_url(), &AdmissionRules::default());
        assert_eq!(
            links,
            vec![
                "https://uel.edu.vn/b".to_string(),
                "https://uel.edu.vn/a".to_string(),
                "https://uel.edu.vn/b".to_string()
            ]
        );
    }

    #[test]
    fn test_malformed_html_does_not_panic() {
        let html = r#"<html><body><a href="https://uel.edu.vn/a">unclosed <div><a href="https://uel.edu.vn/b""#;
        let links = extract_page_links(html, &base_url(), &AdmissionRules::default());
        assert!(links.contains(&"https://uel.edu.vn/a".to_string()));
    }
}
