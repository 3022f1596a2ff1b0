use crate::config::QuotaConfig;
use crate::quota::{Owner, QuotaError, UsageInfo, UsageLookup};
use crate::storage::{KvStore, PutOptions};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Stored form of a quota window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct QuotaRecord {
    count: u32,
    /// Window end, Unix milliseconds
    #[serde(rename = "resetAt")]
    reset_at: i64,
}

impl QuotaRecord {
    fn reset_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.reset_at).single()
    }
}

/// Reads and advances per-owner usage counters
///
/// Increments are a plain read-modify-write against the store. Two concurrent
/// scrapes for the same owner can both pass the limit check and both
/// increment from the same count, so the effective limit may be exceeded by a
/// small margin.
pub struct QuotaLedger<S> {
    store: S,
    config: QuotaConfig,
}

impl<S: KvStore> QuotaLedger<S> {
    pub fn new(store: S, config: QuotaConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Key of the owner's quota record
    pub fn key(&self, owner: &Owner) -> String {
        format!(
            "{}:{}:{}",
            self.config.namespace, owner.owner_type, owner.owner_id
        )
    }

    pub fn limit_for(&self, owner: &Owner) -> u32 {
        self.config.limit_for(owner.owner_type)
    }

    /// Reads the owner's current usage, never failing
    pub fn usage(&self, owner: &Owner) -> UsageLookup {
        let limit = self.limit_for(owner);
        let key = self.key(owner);

        match self.store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<QuotaRecord>(&raw) {
                Ok(record) => UsageLookup::Recorded(UsageInfo {
                    used: record.count,
                    limit,
                    reset_at: record.reset_at(),
                }),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable quota record {}: {}", key, e);
                    UsageLookup::Fresh(UsageInfo::unused(limit))
                }
            },
            Ok(None) => UsageLookup::Fresh(UsageInfo::unused(limit)),
            Err(e) => {
                tracing::warn!("Quota store read failed for {}: {}", key, e);
                UsageLookup::Unavailable {
                    usage: UsageInfo::unused(limit),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Records one successful scrape for the owner
    pub fn increment(&self, owner: &Owner) -> Result<UsageInfo, QuotaError> {
        self.increment_at(owner, Utc::now())
    }

    /// Records one successful scrape as of `now`
    ///
    /// A missing record starts a window ending at `now + window`; an existing
    /// record keeps its `resetAt` and only the count moves.
    pub fn increment_at(&self, owner: &Owner, now: DateTime<Utc>) -> Result<UsageInfo, QuotaError> {
        let key = self.key(owner);

        let existing = match self.store.get(&key)? {
            Some(raw) => match serde_json::from_str::<QuotaRecord>(&raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Replacing unreadable quota record {}: {}", key, e);
                    None
                }
            },
            None => None,
        };

        let record = match existing {
            Some(record) => QuotaRecord {
                count: record.count.saturating_add(1),
                reset_at: record.reset_at,
            },
            None => QuotaRecord {
                count: 1,
                reset_at: (now + self.config.window()).timestamp_millis(),
            },
        };

        let value = serde_json::to_string(&record)?;
        // Store expirations are whole seconds; round up so the record never
        // disappears before resetAt
        let expires_at = record.reset_at.saturating_add(999).div_euclid(1000);
        self.store
            .put(&key, &value, PutOptions::expires_at(expires_at))?;

        Ok(UsageInfo {
            used: record.count,
            limit: self.limit_for(owner),
            reset_at: record.reset_at(),
        })
    }
}
