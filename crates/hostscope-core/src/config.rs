//! Search pipeline limits.

use device_inventory::MAX_DETAIL_IDS;
use serde::{Deserialize, Serialize};

/// Ceilings and fan-out width for one search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Non-empty input lines accepted before the batch is refused
    pub max_batch_lines: usize,
    /// Unique matched devices accepted before enrichment is refused
    pub max_unique_matches: usize,
    /// Lookups allowed in flight at once
    pub concurrency: usize,
    /// Results kept per partial-match query
    pub search_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_batch_lines: 5000,
            max_unique_matches: 5000,
            concurrency: 100,
            search_limit: 50,
        }
    }
}

impl SearchConfig {
    /// Defaults, overridden by `HOSTSCOPE_CONCURRENCY` and `HOSTSCOPE_SEARCH_LIMIT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = env_usize("HOSTSCOPE_CONCURRENCY") {
            config.concurrency = n;
        }
        if let Some(n) = env_usize("HOSTSCOPE_SEARCH_LIMIT") {
            config.search_limit = n;
        }
        config.normalized()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self.normalized()
    }

    /// Clamp values that would stall the pipeline or overflow one detail fetch.
    pub fn normalized(mut self) -> Self {
        self.max_unique_matches = self.max_unique_matches.min(MAX_DETAIL_IDS);
        self.concurrency = self.concurrency.max(1);
        self.search_limit = self.search_limit.max(1);
        self
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
