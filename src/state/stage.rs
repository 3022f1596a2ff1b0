/// Stage definitions for a single scrape
///
/// This module defines every step a scrape passes through, in order.
use std::fmt;

/// Represents the current step of a scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeStage {
    // ===== Active States =====
    /// Checking the URL against scheme, length and domain rules
    Validating,

    /// Reading the owner's usage from the store
    QuotaChecking,

    /// Fetching and evaluating robots.txt
    RobotsChecking,

    /// Fetching the document
    Fetching,

    /// Extracting content from the fetched document
    Parsing,

    /// Recording the successful scrape against the owner's quota
    QuotaIncrementing,

    // ===== Terminal States =====
    /// Scrape produced a result
    Done,

    /// Scrape stopped with an error
    Failed,
}

impl ScrapeStage {
    /// First stage of every scrape
    pub const START: Self = Self::Validating;

    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if this stage performs network I/O
    pub fn is_network(&self) -> bool {
        matches!(self, Self::RobotsChecking | Self::Fetching)
    }

    /// The stage that follows a successful step, or None when terminal
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Validating => Some(Self::QuotaChecking),
            Self::QuotaChecking => Some(Self::RobotsChecking),
            Self::RobotsChecking => Some(Self::Fetching),
            Self::Fetching => Some(Self::Parsing),
            Self::Parsing => Some(Self::QuotaIncrementing),
            Self::QuotaIncrementing => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Returns true if moving from `self` to `target` is allowed
    ///
    /// Any active stage may fail; otherwise only the successor is reachable.
    pub fn can_transition_to(&self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == Self::Failed || self.next() == Some(target)
    }

    /// Moves to the next stage in place, returning the new stage
    ///
    /// Terminal stages stay where they are.
    pub fn advance(&mut self) -> Self {
        if let Some(next) = self.next() {
            *self = next;
        }
        *self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::QuotaChecking => "quota_checking",
            Self::RobotsChecking => "robots_checking",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::QuotaIncrementing => "quota_incrementing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all stages in pipeline order
    pub fn all_stages() -> Vec<Self> {
        vec![
            Self::Validating,
            Self::QuotaChecking,
            Self::RobotsChecking,
            Self::Fetching,
            Self::Parsing,
            Self::QuotaIncrementing,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl Default for ScrapeStage {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for ScrapeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
