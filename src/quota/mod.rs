//! Per-owner daily usage quota
//!
//! Quota records live in the shared key-value store under
//! `{namespace}:{owner_type}:{owner_id}`. A window starts on the first scrape,
//! is never reset by later increments, and ends when the store expires the
//! record at `resetAt`.

mod ledger;

pub use ledger::QuotaLedger;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::storage::StorageError;

/// Kind of identity a quota is tracked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    User,
    Guest,
}

impl OwnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown owner type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown owner type '{0}' (expected 'user' or 'guest')")]
pub struct ParseOwnerTypeError(String);

impl FromStr for OwnerType {
    type Err = ParseOwnerTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            other => Err(ParseOwnerTypeError(other.to_string())),
        }
    }
}

/// Opaque identity used only as a quota key component
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    pub owner_type: OwnerType,
    pub owner_id: String,
}

impl Owner {
    pub fn new(owner_type: OwnerType, owner_id: impl Into<String>) -> Self {
        Self {
            owner_type,
            owner_id: owner_id.into(),
        }
    }

    pub fn guest(owner_id: impl Into<String>) -> Self {
        Self::new(OwnerType::Guest, owner_id)
    }

    pub fn user(owner_id: impl Into<String>) -> Self {
        Self::new(OwnerType::User, owner_id)
    }
}

/// Usage snapshot returned with every scrape outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInfo {
    pub used: u32,
    pub limit: u32,
    pub reset_at: Option<DateTime<Utc>>,
}

impl UsageInfo {
    /// A window that has not started yet
    pub fn unused(limit: u32) -> Self {
        Self {
            used: 0,
            limit,
            reset_at: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

/// Result of reading an owner's usage
///
/// A read never fails: a missing record or an unreachable store both yield a
/// zero-usage snapshot, and the variant says which path was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageLookup {
    /// A live record was found
    Recorded(UsageInfo),
    /// No record exists (or it was unreadable); a fresh window applies
    Fresh(UsageInfo),
    /// The store could not be read; usage is assumed to be zero
    Unavailable { usage: UsageInfo, reason: String },
}

impl UsageLookup {
    pub fn usage(&self) -> &UsageInfo {
        match self {
            Self::Recorded(usage) | Self::Fresh(usage) => usage,
            Self::Unavailable { usage, .. } => usage,
        }
    }

    pub fn into_usage(self) -> UsageInfo {
        match self {
            Self::Recorded(usage) | Self::Fresh(usage) => usage,
            Self::Unavailable { usage, .. } => usage,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Quota write failures
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Quota store error: {0}")]
    Store(#[from] StorageError),

    #[error("Failed to encode quota record: {0}")]
    Encode(#[from] serde_json::Error),
}
