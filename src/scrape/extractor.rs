//! HTML content extractor
//!
//! Turns an HTML document into an [`ExtractedContent`]:
//! - title, description and metadata from `<head>`
//! - readable text from the first `<article>`, else `<main>`, else `<body>`
//! - absolute, deduplicated, capped link and image lists
//!
//! All string fields are truncated by characters to the configured maxima.

use crate::config::ExtractionConfig;
use crate::scrape::types::{ExtractedContent, PageMetadata};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

const UNTITLED: &str = "Untitled Page";
const DEFAULT_CHARSET: &str = "UTF-8";

/// Containers searched for readable text, in priority order
const TEXT_ROOTS: &[&str] = &["article", "main", "body"];
const TEXT_ELEMENTS: &str = "p, h1, h2, h3, h4, h5, h6, li";

/// Extraction failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// Extracts structured content with configured caps
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    limits: ExtractionConfig,
}

impl ContentExtractor {
    pub fn new(limits: ExtractionConfig) -> Self {
        Self { limits }
    }

    /// Parses HTML content and extracts everything the result needs
    ///
    /// # Arguments
    ///
    /// * `html` - The HTML content to parse
    /// * `source_url` - The page URL, used to resolve relative references
    ///
    /// # Example
    ///
    /// ```
    /// use url::Url;
    /// use webscraper::config::ExtractionConfig;
    /// use webscraper::scrape::ContentExtractor;
    ///
    /// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
    /// let base_url = Url::parse("https://example.com/").unwrap();
    /// let content = ContentExtractor::new(ExtractionConfig::default())
    ///     .extract(html, &base_url)
    ///     .unwrap();
    /// assert_eq!(content.title, "Test");
    /// assert_eq!(content.links, vec!["https://example.com/page".to_string()]);
    /// ```
    pub fn extract(&self, html: &str, source_url: &Url) -> Result<ExtractedContent, ExtractError> {
        let document = Html::parse_document(html);

        let title = text_of_first(&document, "title")?
            .map(|t| truncate_chars(&t, self.limits.max_title_length))
            .unwrap_or_else(|| UNTITLED.to_string());

        let description = match meta_content(&document, "meta[name='description']")? {
            Some(d) => Some(d),
            None => meta_content(&document, "meta[property='og:description']")?,
        }
        .map(|d| truncate_chars(&d, self.limits.max_description_length));

        Ok(ExtractedContent {
            url: source_url.to_string(),
            title,
            description,
            text: self.extract_text(&document)?,
            metadata: extract_metadata(&document, source_url)?,
            links: collect_urls(&document, "a[href]", "href", source_url, self.limits.max_links)?,
            images: collect_urls(&document, "img[src]", "src", source_url, self.limits.max_images)?,
        })
    }

    fn extract_text(&self, document: &Html) -> Result<String, ExtractError> {
        let mut root = None;
        for css in TEXT_ROOTS {
            if let Some(element) = document.select(&selector(css)?).next() {
                root = Some(element);
                break;
            }
        }

        let Some(root) = root else {
            return Ok(String::new());
        };

        let text_selector = selector(TEXT_ELEMENTS)?;
        let fragments: Vec<String> = root
            .select(&text_selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();

        Ok(truncate_chars(&fragments.join(" "), self.limits.max_text_length))
    }
}

fn extract_metadata(document: &Html, source_url: &Url) -> Result<PageMetadata, ExtractError> {
    let charset = match attr_of_first(document, "meta[charset]", "charset")? {
        Some(charset) => Some(charset),
        None => charset_from_http_equiv(document)?,
    }
    .unwrap_or_else(|| DEFAULT_CHARSET.to_string());

    let canonical = attr_of_first(document, "link[rel='canonical'][href]", "href")?
        .map(|href| resolve_reference(&href, source_url).unwrap_or(href));

    Ok(PageMetadata {
        author: meta_content(document, "meta[name='author']")?,
        publish_date: meta_content(document, "meta[property='article:published_time']")?,
        language: attr_of_first(document, "html[lang]", "lang")?,
        charset,
        og_image: meta_content(document, "meta[property='og:image']")?,
        og_title: meta_content(document, "meta[property='og:title']")?,
        og_description: meta_content(document, "meta[property='og:description']")?,
        twitter_card: meta_content(document, "meta[name='twitter:card']")?,
        canonical,
    })
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Collapses whitespace runs in an element's text into single spaces
fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn text_of_first(document: &Html, css: &str) -> Result<Option<String>, ExtractError> {
    Ok(document
        .select(&selector(css)?)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty()))
}

fn attr_of_first(document: &Html, css: &str, attr: &str) -> Result<Option<String>, ExtractError> {
    Ok(document
        .select(&selector(css)?)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

fn meta_content(document: &Html, css: &str) -> Result<Option<String>, ExtractError> {
    attr_of_first(document, css, "content")
}

/// Charset declared by the first `http-equiv="Content-Type"` meta that has one
fn charset_from_http_equiv(document: &Html) -> Result<Option<String>, ExtractError> {
    Ok(document
        .select(&selector("meta[http-equiv][content]")?)
        .filter(|element| {
            element
                .value()
                .attr("http-equiv")
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("content-type"))
        })
        .find_map(|element| {
            element
                .value()
                .attr("content")
                .and_then(charset_from_content_type)
        }))
}

/// Pulls `charset=...` out of a `Content-Type` style value
fn charset_from_content_type(content: &str) -> Option<String> {
    content.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Resolves every `attr` of elements matching `css`, keeping the first
/// occurrence of each URL and at most `cap` entries
fn collect_urls(
    document: &Html,
    css: &str,
    attr: &str,
    base_url: &Url,
    cap: usize,
) -> Result<Vec<String>, ExtractError> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for element in document.select(&selector(css)?) {
        if urls.len() >= cap {
            break;
        }
        let Some(raw) = element.value().attr(attr) else {
            continue;
        };
        if let Some(absolute) = resolve_reference(raw, base_url) {
            if seen.insert(absolute.clone()) {
                urls.push(absolute);
            }
        }
    }

    Ok(urls)
}

/// Resolves a reference to an absolute http(s) URL
///
/// Returns None if the reference should be dropped:
/// - empty or fragment-only references
/// - javascript:, mailto:, tel:, data: and any other non-HTTP(S) scheme
/// - references that do not parse
fn resolve_reference(raw: &str, base_url: &Url) -> Option<String> {
    let raw = raw.trim();

    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let absolute = base_url.join(raw).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

/// Truncates to at most `max` characters without splitting a code point
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((byte_index, _)) => value[..byte_index].to_string(),
        None => value.to_string(),
    }
}
