//! Robots.txt parser implementation
//!
//! Line-oriented parsing into per-agent rule records, rule selection by agent
//! token, and prefix-based path evaluation.
//!
//! Every `User-agent:` line opens a new rule record. Consecutive `User-agent`
//! lines are therefore *not* merged into one group the way strict robots.txt
//! grouping would; the earlier records simply end up empty.

/// One `User-agent` record and the directives that followed it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsTxtRule {
    pub user_agent: String,
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    pub crawl_delay: Option<f64>,
}

impl RobotsTxtRule {
    fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            ..Self::default()
        }
    }

    /// Evaluates a path against this record
    ///
    /// Disallow entries match by prefix; when an allow prefix also matches,
    /// the path is allowed.
    pub fn is_allowed(&self, path: &str) -> bool {
        let disallowed = self.disallow.iter().any(|prefix| path.starts_with(prefix));
        if !disallowed {
            return true;
        }
        self.allow.iter().any(|prefix| path.starts_with(prefix))
    }
}

/// Parsed robots.txt data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotsTxt {
    rules: Vec<RobotsTxtRule>,
}

impl RobotsTxt {
    /// Parses raw robots.txt content
    ///
    /// Unknown directives, comments, blank lines and directives appearing
    /// before the first `User-agent` line are ignored. Never fails: content
    /// that contains no recognisable directives yields an allow-all set.
    pub fn parse(content: &str) -> Self {
        let mut rules: Vec<RobotsTxtRule> = Vec::new();

        for line in content.lines() {
            // Strip comments
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                rules.push(RobotsTxtRule::new(value));
                continue;
            }

            let Some(current) = rules.last_mut() else {
                continue;
            };

            match key.as_str() {
                // An empty value matches nothing, so it is not recorded
                "disallow" if !value.is_empty() => current.disallow.push(value.to_string()),
                "allow" if !value.is_empty() => current.allow.push(value.to_string()),
                "crawl-delay" => {
                    if let Ok(delay) = value.parse::<f64>() {
                        current.crawl_delay = Some(delay);
                    }
                }
                _ => {}
            }
        }

        Self { rules }
    }

    /// Creates a permissive set with no rules
    ///
    /// This is the effective policy whenever robots.txt is absent.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Returns all parsed rule records in file order
    pub fn rules(&self) -> &[RobotsTxtRule] {
        &self.rules
    }

    /// Selects the rule record that applies to `agent`
    ///
    /// An exact case-insensitive match on the agent token wins; otherwise the
    /// first `*` record applies.
    pub fn rule_for(&self, agent: &str) -> Option<&RobotsTxtRule> {
        self.rules
            .iter()
            .find(|rule| rule.user_agent.eq_ignore_ascii_case(agent))
            .or_else(|| self.rules.iter().find(|rule| rule.user_agent == "*"))
    }

    /// Checks if a path is allowed for the given agent token
    ///
    /// # Arguments
    ///
    /// * `path` - The URL path to check (e.g., "/page.html")
    /// * `agent` - The agent token (e.g., "WebScraperBot")
    pub fn is_allowed(&self, path: &str, agent: &str) -> bool {
        match self.rule_for(agent) {
            Some(rule) => rule.is_allowed(path),
            None => true,
        }
    }

    /// Gets the crawl delay (seconds) declared for the given agent token
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        self.rule_for(agent).and_then(|rule| rule.crawl_delay)
    }
}
