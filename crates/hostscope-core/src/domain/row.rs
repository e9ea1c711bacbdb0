//! Lookup outcomes and output rows.

use chrono::{DateTime, SecondsFormat, Utc};
use device_inventory::DeviceId;
use serde::{Deserialize, Serialize};

/// Placeholder rendered for absent optional fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Guidance attached to per-token transient failures.
pub const RETRY_GUIDANCE: &str =
    "Search experienced a transient error. Please try this name again in a smaller search list.";

/// Result of resolving a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Matched { token: String, identities: Vec<DeviceId> },
    NotFound { token: String },
    TransientError { token: String, message: String },
}

/// A ceiling was exceeded and the work was refused rather than truncated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Refusal {
    /// Too many input lines; nothing was looked up.
    BatchTooLarge { lines: usize, limit: usize },
    /// Too many unique matches; enrichment was skipped.
    AggregateTooLarge { matches: usize, limit: usize },
}

impl std::fmt::Display for Refusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Refusal::BatchTooLarge { lines, limit } => write!(
                f,
                "Too many names to search ({lines} entered). Please try again with no more than {limit} names."
            ),
            Refusal::AggregateTooLarge { matches, limit } => write!(
                f,
                "{matches} hosts found. Please reduce the number of partial names to stay under \
                 {limit} results. Any names above that reported found as false were confirmed \
                 not to be found."
            ),
        }
    }
}

/// Enriched description of one matched device.
///
/// Optional fields stay `None` here; the `*_display` helpers apply the
/// rendering defaults (`N/A`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceRecord {
    pub hostname: String,
    /// Always true for enriched rows.
    pub found: bool,
    pub agent_version: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub first_seen: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub tenant_id: String,
    /// Friendly name resolved from the tenant directory.
    pub tenant_name: String,
    pub instance_id: Option<String>,
    pub device_id: DeviceId,
}

impl DeviceRecord {
    /// Tags joined with `;` so the value stays one CSV cell.
    pub fn tags_display(&self) -> String {
        match &self.tags {
            Some(tags) => tags.join(";"),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    /// "friendly-name : raw-id"
    pub fn tenant_display(&self) -> String {
        format!("{} : {}", self.tenant_name, self.tenant_id)
    }

    pub fn instance_id_display(&self) -> &str {
        self.instance_id.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn last_seen_display(&self) -> String {
        timestamp_display(self.last_seen)
    }

    pub fn first_seen_display(&self) -> String {
        timestamp_display(self.first_seen)
    }
}

fn timestamp_display(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// One line of search output.
///
/// Order across rows is not the input order: lookups complete concurrently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputRow {
    Device(DeviceRecord),
    NotFound { token: String },
    TransientError { token: String, message: String },
    Refused(Refusal),
}

impl OutputRow {
    /// Found flag for rows that carry one.
    pub fn found(&self) -> Option<bool> {
        match self {
            OutputRow::Device(_) => Some(true),
            OutputRow::NotFound { .. } => Some(false),
            _ => None,
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            OutputRow::TransientError { .. } | OutputRow::Refused(_)
        )
    }

    pub fn as_device(&self) -> Option<&DeviceRecord> {
        match self {
            OutputRow::Device(record) => Some(record),
            _ => None,
        }
    }
}

impl From<Refusal> for OutputRow {
    fn from(refusal: Refusal) -> Self {
        OutputRow::Refused(refusal)
    }
}

impl From<DeviceRecord> for OutputRow {
    fn from(record: DeviceRecord) -> Self {
        OutputRow::Device(record)
    }
}
