//! Scrape module for single-page fetching and extraction
//!
//! This module contains the per-request pipeline, including:
//! - Bounded HTTP fetching with timeout, size and content-type limits
//! - HTML content extraction
//! - Orchestration of validation, quota, robots.txt, fetch and extraction

mod coordinator;
mod extractor;
pub(crate) mod fetcher;
mod types;

pub use coordinator::Scraper;
pub use extractor::{truncate_chars, ContentExtractor, ExtractError};
pub use fetcher::{build_http_client, is_html_content_type, FetchError, FetchedPage, PageFetcher};
pub use types::{ExtractedContent, PageMetadata, ScrapeInput, ScrapeOutcome, ScrapingResult};
