//! Search pipeline facade.
//!
//! `HostSearch::search` is the single entry point for callers: raw text in,
//! output rows out. Stages run strictly in order:
//! classify → resolve → aggregate → enrich.
//!
//! Only a failed detail fetch is returned as an error. Ceiling refusals and
//! per-token failures come back as rows.

use std::sync::Arc;
use std::time::Instant;

use device_inventory::DeviceInventory;
use tracing::Instrument;

use crate::aggregator::aggregate;
use crate::classifier::Classifier;
use crate::config::SearchConfig;
use crate::domain::{OutputRow, Result};
use crate::enricher::Enricher;
use crate::obs::{self, SearchId};
use crate::resolver::resolve;
use crate::tenant::TenantDirectory;

pub struct HostSearch {
    inventory: Arc<dyn DeviceInventory>,
    classifier: Classifier,
    enricher: Enricher,
    config: SearchConfig,
}

impl HostSearch {
    pub fn new(
        inventory: Arc<dyn DeviceInventory>,
        tenants: TenantDirectory,
        config: SearchConfig,
    ) -> Result<Self> {
        let config = config.normalized();
        Ok(Self {
            inventory,
            classifier: Classifier::new(config.max_batch_lines)?,
            enricher: Enricher::new(tenants),
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Resolve and enrich every name in `raw`.
    ///
    /// Row order: per-token NotFound / TransientError rows first (in
    /// completion order), then either the enriched device rows or a single
    /// aggregate refusal row.
    pub async fn search(&self, raw: &str) -> Result<Vec<OutputRow>> {
        let search_id = SearchId::new();
        self.run(search_id, raw)
            .instrument(obs::search_span(&search_id))
            .await
    }

    async fn run(&self, search_id: SearchId, raw: &str) -> Result<Vec<OutputRow>> {
        let start = Instant::now();
        obs::emit_search_started(&search_id, raw.lines().count());

        let batch = match self.classifier.classify(raw) {
            Ok(batch) => batch,
            Err(refusal) => {
                obs::emit_search_refused(&search_id, &refusal);
                return Ok(vec![refusal.into()]);
            }
        };
        obs::emit_search_classified(&search_id, batch.instance_ids.len(), batch.hostnames.len());

        let resolution = resolve(Arc::clone(&self.inventory), &batch, &self.config).await;
        obs::emit_search_resolved(
            &search_id,
            resolution.matched_tokens,
            resolution.not_found_count(),
            resolution.error_count(),
            resolution.identities.len(),
        );

        let mut rows = resolution.rows;
        let mut devices = 0;
        match aggregate(resolution.identities, self.config.max_unique_matches) {
            Ok(unique) => {
                let records = self
                    .enricher
                    .enrich(self.inventory.as_ref(), &unique)
                    .await?;
                devices = records.len();
                rows.extend(records.into_iter().map(OutputRow::Device));
            }
            Err(refusal) => {
                obs::emit_search_refused(&search_id, &refusal);
                rows.push(refusal.into());
            }
        }

        obs::emit_search_finished(
            &search_id,
            start.elapsed().as_millis() as u64,
            rows.len(),
            devices,
        );
        Ok(rows)
    }
}
