//! Scrape coordinator - single-request orchestration logic
//!
//! Runs one scrape from start to finish:
//! - Feature flag and URL validation
//! - Quota check against the owner's daily window
//! - robots.txt check for the target path
//! - Bounded fetch and content extraction
//! - Quota increment on success

use crate::config::Config;
use crate::quota::{Owner, OwnerType, QuotaLedger, UsageInfo};
use crate::robots::RobotsResolver;
use crate::scrape::{build_http_client, ContentExtractor, PageFetcher, ScrapeInput, ScrapeOutcome};
use crate::state::ScrapeStage;
use crate::storage::KvStore;
use crate::url::{extract_domain, validate_url};
use crate::ScrapeError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Main scraper structure
///
/// Holds no per-request state; one instance can serve any number of
/// concurrent scrapes.
pub struct Scraper<S> {
    config: Arc<Config>,
    fetcher: PageFetcher,
    robots: RobotsResolver,
    extractor: ContentExtractor,
    ledger: QuotaLedger<S>,
}

impl<S: KvStore> Scraper<S> {
    /// Creates a new scraper instance
    ///
    /// # Arguments
    ///
    /// * `config` - The scraper configuration
    /// * `store` - Key-value store holding quota records
    ///
    /// # Returns
    ///
    /// * `Ok(Scraper)` - Successfully created scraper
    /// * `Err(reqwest::Error)` - The HTTP client could not be built
    pub fn new(config: Config, store: S) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;

        Ok(Self {
            fetcher: PageFetcher::new(client.clone(), &config),
            robots: RobotsResolver::new(client, &config),
            extractor: ContentExtractor::new(config.extraction.clone()),
            ledger: QuotaLedger::new(store, config.quota.clone()),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &QuotaLedger<S> {
        &self.ledger
    }

    /// Scrapes one URL on behalf of an owner
    pub async fn scrape(
        &self,
        input: &ScrapeInput,
        owner_type: OwnerType,
        owner_id: &str,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let cancel = CancellationToken::new();
        self.scrape_with_cancellation(input, owner_type, owner_id, &cancel)
            .await
    }

    /// Scrapes one URL, stopping any pending network call when `cancel` fires
    ///
    /// A cancelled scrape fails with `fetch_error` and does not count against
    /// the owner's quota.
    pub async fn scrape_with_cancellation(
        &self,
        input: &ScrapeInput,
        owner_type: OwnerType,
        owner_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let owner = Owner::new(owner_type, owner_id);
        let started = Instant::now();

        if !self.config.scraper.enabled {
            return Err(self.fail(&owner, ScrapeStage::Validating, ScrapeError::FeatureDisabled));
        }

        tracing::info!(
            event = "scrape_requested",
            url = %input.url,
            owner_type = %owner.owner_type,
            owner_id = %owner.owner_id,
        );

        let mut stage = ScrapeStage::START;

        // Validating
        let url = validate_url(&input.url, &self.config.validation)
            .map_err(|e| self.fail(&owner, stage, e.into()))?;
        stage.advance();

        // QuotaChecking
        let lookup = self.ledger.usage(&owner);
        if lookup.is_fallback() {
            tracing::debug!("Quota read failed for {}, assuming no usage", self.ledger.key(&owner));
        }
        let current = lookup.into_usage();
        if current.is_exhausted() {
            return Err(self.fail(&owner, stage, ScrapeError::QuotaExceeded { usage: current }));
        }
        stage.advance();

        // RobotsChecking
        let verdict = self
            .robots
            .check(&url, cancel)
            .await
            .map_err(|e| self.fail(&owner, stage, e.into()))?;
        if !verdict.is_allowed() {
            return Err(self.fail(
                &owner,
                stage,
                ScrapeError::RobotsBlocked {
                    url: url.to_string(),
                },
            ));
        }
        tracing::debug!("robots.txt verdict for {}: {:?}", url, verdict);
        stage.advance();

        // Fetching
        let page = self
            .fetcher
            .fetch(&url, cancel)
            .await
            .map_err(|e| self.fail(&owner, stage, e.into()))?;
        if page.final_url != url {
            // The landing page of a redirect chain must be allowed too
            let landed = self
                .robots
                .check(&page.final_url, cancel)
                .await
                .map_err(|e| self.fail(&owner, stage, e.into()))?;
            if !landed.is_allowed() {
                return Err(self.fail(
                    &owner,
                    stage,
                    ScrapeError::RobotsBlocked {
                        url: page.final_url.to_string(),
                    },
                ));
            }
        }
        stage.advance();

        // Parsing
        let content = self
            .extractor
            .extract(&page.body, &page.final_url)
            .map_err(|e| self.fail(&owner, stage, e.into()))?;
        let result = content.into_result(Utc::now(), verdict.is_allowed());
        stage.advance();

        // QuotaIncrementing
        let usage = self.record_usage(&owner, current);
        stage.advance();

        tracing::info!(
            event = "scrape_completed",
            url = %result.url,
            domain = %extract_domain(&page.final_url).unwrap_or_default(),
            owner_type = %owner.owner_type,
            status_code = page.status_code,
            bytes = page.body.len(),
            links = result.links.len(),
            images = result.images.len(),
            used = usage.used,
            limit = usage.limit,
            elapsed_ms = started.elapsed().as_millis() as u64,
            stage = %stage,
        );

        Ok(ScrapeOutcome { result, usage })
    }

    /// Increments the owner's quota, falling back to a local count when the
    /// store write fails
    fn record_usage(&self, owner: &Owner, before: UsageInfo) -> UsageInfo {
        match self.ledger.increment(owner) {
            Ok(usage) => usage,
            Err(e) => {
                tracing::warn!(
                    "Failed to record usage for {}: {}",
                    self.ledger.key(owner),
                    e
                );
                UsageInfo {
                    used: before.used.saturating_add(1),
                    ..before
                }
            }
        }
    }

    fn fail(&self, owner: &Owner, stage: ScrapeStage, error: ScrapeError) -> ScrapeError {
        tracing::warn!(
            event = "scrape_failed",
            error_kind = error.code(),
            stage = %stage,
            owner_type = %owner.owner_type,
            error = %error,
        );
        error
    }
}
