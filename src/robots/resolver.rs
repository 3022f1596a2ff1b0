//! Robots.txt resolution for a single target URL
//!
//! Fetches the origin's robots.txt, parses it, and evaluates the target path.
//! Anything short of an explicit `Disallow` match resolves to "allowed"; the
//! verdict records which path was taken so callers can tell a real allow
//! from a fallback.

use crate::config::Config;
use crate::robots::RobotsTxt;
use crate::scrape::fetcher::read_body_limited;
use crate::scrape::FetchError;
use crate::url::robots_txt_url;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a robots.txt check
#[derive(Debug, Clone, PartialEq)]
pub enum RobotsVerdict {
    /// robots.txt was fetched and permits the path
    Allowed,
    /// robots.txt was fetched and an explicit `Disallow` matches the path
    Disallowed,
    /// robots.txt answered with a non-2xx status; treated as allowed
    NoRobotsFile { status: u16 },
    /// robots.txt could not be fetched; treated as allowed
    Unavailable { reason: String },
    /// Enforcement is disabled by configuration
    Skipped,
}

impl RobotsVerdict {
    /// Returns true unless robots.txt explicitly disallows the path
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Disallowed)
    }

    /// Returns true if the verdict is a fail-open fallback rather than a
    /// decision made from actual rules
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::NoRobotsFile { .. } | Self::Unavailable { .. })
    }
}

/// What came back from the robots.txt request
enum RobotsFetch {
    Found(String),
    Missing(u16),
}

/// Fetches and evaluates robots.txt with the scraper's own agent token
#[derive(Debug, Clone)]
pub struct RobotsResolver {
    client: Client,
    agent: String,
    timeout: Duration,
    max_bytes: u64,
    enabled: bool,
}

impl RobotsResolver {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            agent: config.user_agent.robots_token().to_string(),
            timeout: config.scraper.robots_timeout(),
            max_bytes: config.scraper.max_response_size,
            enabled: config.scraper.respect_robots_txt,
        }
    }

    /// Checks whether `url` may be fetched
    ///
    /// # Returns
    ///
    /// * `Ok(RobotsVerdict)` - The verdict, including fail-open fallbacks
    /// * `Err(FetchError::Cancelled)` - `cancel` fired while the request was pending
    pub async fn check(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<RobotsVerdict, FetchError> {
        if !self.enabled {
            return Ok(RobotsVerdict::Skipped);
        }

        let Some(robots_url) = robots_txt_url(url) else {
            return Ok(self.unavailable(url, "cannot derive robots.txt location".to_string()));
        };

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.fetch(&robots_url)) => {
                result.unwrap_or(Err(FetchError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }))
            }
        };

        match fetched {
            Ok(RobotsFetch::Missing(status)) => {
                tracing::debug!("No robots.txt at {} (HTTP {})", robots_url, status);
                Ok(RobotsVerdict::NoRobotsFile { status })
            }
            Ok(RobotsFetch::Found(body)) => {
                let robots = RobotsTxt::parse(&body);
                if robots.is_allowed(url.path(), &self.agent) {
                    Ok(RobotsVerdict::Allowed)
                } else {
                    Ok(RobotsVerdict::Disallowed)
                }
            }
            Err(e) => Ok(self.unavailable(url, e.to_string())),
        }
    }

    async fn fetch(&self, robots_url: &Url) -> Result<RobotsFetch, FetchError> {
        let response = self
            .client
            .get(robots_url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(RobotsFetch::Missing(status.as_u16()));
        }

        let body = read_body_limited(response, self.max_bytes, self.timeout).await?;
        Ok(RobotsFetch::Found(body))
    }

    fn unavailable(&self, url: &Url, reason: String) -> RobotsVerdict {
        tracing::warn!(
            event = "robots_txt_check_failed",
            url = %url,
            reason = %reason,
            "robots.txt check failed, allowing request"
        );
        RobotsVerdict::Unavailable { reason }
    }
}
