//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the scraper:
//! - Building the HTTP client with the declared user agent and a redirect
//!   policy that re-validates every hop
//! - Bounded GET of the target document (time, size, content type)
//! - Error classification

use crate::config::{Config, ValidationConfig};
use crate::url::validate_url;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Content types accepted as HTML documents
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_HEADER: &str = "en-US,en;q=0.9";

/// Reasons a fetch can fail
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} response")]
    Status { status: u16 },

    #[error("Unsupported content type: {0}")]
    ContentType(String),

    #[error("Response too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Classifies a reqwest error, keeping timeouts distinct from other
    /// network failures
    pub(crate) fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if error.is_connect() {
            Self::Network(format!("connection failed: {}", error))
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// A successfully fetched HTML document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Decoded page body
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed up to `max_redirects` hops, and every hop is passed
/// through the URL validator so a redirect cannot land on a blocked host.
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let validation = config.validation.clone();
    let max_redirects = config.scraper.max_redirects;

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .connect_timeout(config.scraper.fetch_timeout())
        .redirect(redirect_policy(validation, max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

fn redirect_policy(validation: ValidationConfig, max_redirects: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error(format!("too many redirects (max {})", max_redirects));
        }
        match validate_url(attempt.url().as_str(), &validation) {
            Ok(_) => attempt.follow(),
            Err(e) => {
                let message = format!("redirect to {} rejected: {}", attempt.url(), e);
                attempt.error(message)
            }
        }
    })
}

/// Fetches documents under the configured time and size budget
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: u64,
}

impl PageFetcher {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            timeout: config.scraper.fetch_timeout(),
            max_bytes: config.scraper.max_response_size,
        }
    }

    /// Fetches an already-validated URL
    ///
    /// # Request Flow
    ///
    /// 1. GET with Accept / Accept-Language headers
    /// 2. Reject non-2xx statuses
    /// 3. Reject anything that is not `text/html` or `application/xhtml+xml`
    /// 4. Reject a declared `Content-Length` above the budget
    /// 5. Stream the body, aborting as soon as it exceeds the budget
    ///
    /// The whole flow runs under one timeout and stops immediately when
    /// `cancel` fires. Redirect hops are checked against the URL validator
    /// only; robots.txt for the final URL is the caller's concern.
    pub async fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, FetchError> {
        tracing::debug!("Fetching {}", url);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.fetch_unbounded(url)) => {
                result.unwrap_or(Err(FetchError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }))
            }
        }
    }

    async fn fetch_unbounded(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_HEADER)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_HEADER)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return Err(FetchError::ContentType(if content_type.is_empty() {
                "missing".to_string()
            } else {
                content_type
            }));
        }

        let final_url = response.url().clone();
        let body = read_body_limited(response, self.max_bytes, self.timeout).await?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Returns true if the Content-Type header names an HTML media type
///
/// Parameters such as `charset` are ignored and the comparison is
/// case-insensitive.
pub fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    HTML_CONTENT_TYPES.contains(&essence.as_str())
}

/// Reads a response body without ever holding more than `max_bytes`
///
/// The declared `Content-Length` is checked before reading; the streamed and
/// decoded body is checked again because the header may be missing or wrong.
pub(crate) async fn read_body_limited(
    mut response: Response,
    max_bytes: u64,
    timeout: Duration,
) -> Result<String, FetchError> {
    if let Some(declared) = response.content_length() {
        if declared > max_bytes {
            return Err(FetchError::TooLarge {
                size: declared,
                max: max_bytes,
            });
        }
    }

    let mut buffer: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::from_reqwest(e, timeout)
        } else {
            FetchError::Body(e.to_string())
        }
    })? {
        let size = (buffer.len() + chunk.len()) as u64;
        if size > max_bytes {
            return Err(FetchError::TooLarge {
                size,
                max: max_bytes,
            });
        }
        buffer.extend_from_slice(&chunk);
    }

    let body = String::from_utf8_lossy(&buffer).into_owned();
    if body.len() as u64 > max_bytes {
        return Err(FetchError::TooLarge {
            size: body.len() as u64,
            max: max_bytes,
        });
    }

    Ok(body)
}
