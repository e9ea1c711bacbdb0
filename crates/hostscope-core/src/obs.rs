//! Structured observability hooks for search lifecycle events.
//!
//! This module provides:
//! - A request-scoped tracing span via [`search_span`]
//! - Emission functions for key lifecycle events: start, classify, resolve,
//!   refusal, finish, and per-token lookup failures
//!
//! Events are emitted at `info!` level except lookup failures (`warn!`).

use device_inventory::InventoryError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::Refusal;

/// Identifier of one search request, used only for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchId(pub Uuid);

impl SearchId {
    pub fn new() -> Self {
        SearchId(Uuid::new_v4())
    }
}

impl Default for SearchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SearchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Search-scoped span; attach with `tracing::Instrument` so every event
/// emitted while the request runs carries `search_id`.
pub fn search_span(search_id: &SearchId) -> tracing::Span {
    tracing::info_span!("hostscope.search", search_id = %search_id)
}

/// Emit event: search started with the raw (unfiltered) line count.
pub fn emit_search_started(search_id: &SearchId, raw_lines: usize) {
    info!(event = "search.started", search_id = %search_id, raw_lines = raw_lines);
}

/// Emit event: input classified into buckets.
pub fn emit_search_classified(search_id: &SearchId, instance_ids: usize, hostnames: usize) {
    info!(
        event = "search.classified",
        search_id = %search_id,
        instance_ids = instance_ids,
        hostnames = hostnames,
    );
}

/// Emit event: all lookups joined.
pub fn emit_search_resolved(
    search_id: &SearchId,
    matched_tokens: usize,
    not_found: usize,
    errors: usize,
    identities: usize,
) {
    info!(
        event = "search.resolved",
        search_id = %search_id,
        matched_tokens = matched_tokens,
        not_found = not_found,
        errors = errors,
        identities = identities,
    );
}

/// Emit event: a ceiling refused the request or its enrichment.
pub fn emit_search_refused(search_id: &SearchId, refusal: &Refusal) {
    warn!(event = "search.refused", search_id = %search_id, refusal = ?refusal);
}

/// Emit event: search finished.
pub fn emit_search_finished(search_id: &SearchId, duration_ms: u64, rows: usize, devices: usize) {
    info!(
        event = "search.finished",
        search_id = %search_id,
        duration_ms = duration_ms,
        rows = rows,
        devices = devices,
    );
}

/// Emit event: one token's lookup failed (warning level).
pub fn emit_lookup_failed(token: &str, error: &InventoryError) {
    warn!(
        event = "lookup.failed",
        token = %token,
        status = ?error.status(),
        error = %error,
    );
}
