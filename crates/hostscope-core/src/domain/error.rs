//! Domain-level error taxonomy for hostscope.
//!
//! Per-token failures never show up here: the resolver turns them into
//! rows. What remains are request-level failures.

use device_inventory::InventoryError;

/// hostscope errors.
#[derive(Debug, thiserror::Error)]
pub enum HostscopeError {
    /// The single batched detail fetch failed; no identity could be enriched.
    #[error("device detail fetch failed for {requested} identities: {source}")]
    Enrichment {
        requested: usize,
        #[source]
        source: InventoryError,
    },

    #[error("invalid tenant directory {path}: {reason}")]
    TenantDirectory { path: String, reason: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid n-minus value {0}: expected 0, 1 or 2")]
    InvalidNMinus(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hostscope operations.
pub type Result<T> = std::result::Result<T, HostscopeError>;
