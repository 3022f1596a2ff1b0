use crate::quota::UsageInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request accepted by [`Scraper::scrape`](crate::Scraper::scrape)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeInput {
    pub url: String,
}

impl ScrapeInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Best-effort document metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub author: Option<String>,
    pub publish_date: Option<String>,
    pub language: Option<String>,
    pub charset: String,
    pub og_image: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub twitter_card: Option<String>,
    pub canonical: Option<String>,
}

/// Structured content extracted from a page
///
/// Everything here is a pure function of the HTML and its URL, so extracting
/// the same input twice yields equal values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub text: String,
    pub metadata: PageMetadata,
    pub links: Vec<String>,
    pub images: Vec<String>,
}

impl ExtractedContent {
    /// Attaches the capture timestamp and robots.txt verdict
    pub fn into_result(self, scraped_at: DateTime<Utc>, robots_txt_allowed: bool) -> ScrapingResult {
        ScrapingResult {
            url: self.url,
            title: self.title,
            description: self.description,
            text: self.text,
            metadata: self.metadata,
            links: self.links,
            images: self.images,
            scraped_at,
            robots_txt_allowed,
        }
    }
}

/// The result returned to the caller for one scraped page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingResult {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub text: String,
    pub metadata: PageMetadata,
    pub links: Vec<String>,
    pub images: Vec<String>,
    pub scraped_at: DateTime<Utc>,
    pub robots_txt_allowed: bool,
}

/// Successful scrape: the extracted page plus the owner's updated usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeOutcome {
    pub result: ScrapingResult,
    pub usage: UsageInfo,
}
