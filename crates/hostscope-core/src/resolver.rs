//! Concurrent token resolution.
//!
//! Every token gets its own partial-match query. Queries run as tokio tasks
//! gated by a semaphore, so at most `concurrency` are in flight. Each task
//! appends its outcome to a shared list; the list is read only after every
//! task has been joined. A failing or panicking lookup is recorded against
//! its own token and never affects its siblings.

use std::sync::Arc;

use device_inventory::{DeviceId, DeviceInventory};
use tokio::sync::{Mutex, Semaphore};
use tracing::{instrument, warn};

use crate::config::SearchConfig;
use crate::domain::{ClassifiedBatch, LookupOutcome, OutputRow, Token, RETRY_GUIDANCE};
use crate::obs;

/// Everything the resolver learned about a batch.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Matched identities, duplicates included.
    pub identities: Vec<DeviceId>,
    /// NotFound and TransientError rows, in completion order.
    pub rows: Vec<OutputRow>,
    /// Tokens that matched at least one device.
    pub matched_tokens: usize,
}

impl Resolution {
    /// Fold per-token outcomes into identities and rows.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = LookupOutcome>) -> Self {
        let mut resolution = Resolution::default();
        for outcome in outcomes {
            match outcome {
                LookupOutcome::Matched { identities, .. } => {
                    resolution.matched_tokens += 1;
                    resolution.identities.extend(identities);
                }
                LookupOutcome::NotFound { token } => {
                    resolution.rows.push(OutputRow::NotFound { token });
                }
                LookupOutcome::TransientError { token, message } => {
                    resolution
                        .rows
                        .push(OutputRow::TransientError { token, message });
                }
            }
        }
        resolution
    }

    pub fn not_found_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, OutputRow::NotFound { .. }))
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, OutputRow::TransientError { .. }))
            .count()
    }
}

/// Resolve a single token.
pub async fn lookup(inventory: &dyn DeviceInventory, token: &Token, limit: usize) -> LookupOutcome {
    match inventory.search_devices(&token.query(limit)).await {
        Ok(identities) if identities.is_empty() => LookupOutcome::NotFound {
            token: token.value.clone(),
        },
        Ok(identities) => LookupOutcome::Matched {
            token: token.value.clone(),
            identities,
        },
        Err(e) => {
            obs::emit_lookup_failed(&token.value, &e);
            LookupOutcome::TransientError {
                token: token.value.clone(),
                message: RETRY_GUIDANCE.to_string(),
            }
        }
    }
}

/// Resolve every token in `batch` with bounded concurrency.
///
/// Returns only after all lookups have finished.
#[instrument(skip(inventory, batch, config), fields(tokens = batch.len(), concurrency = config.concurrency))]
pub async fn resolve(
    inventory: Arc<dyn DeviceInventory>,
    batch: &ClassifiedBatch,
    config: &SearchConfig,
) -> Resolution {
    let tokens = batch.tokens();
    let limit = config.search_limit;
    let outcomes: Arc<Mutex<Vec<LookupOutcome>>> =
        Arc::new(Mutex::new(Vec::with_capacity(tokens.len())));

    // Semaphore enforces the pool width
    let sem = Arc::new(Semaphore::new(config.concurrency.max(1)));

    let mut tasks = Vec::with_capacity(tokens.len());

    for token in tokens {
        let inventory = Arc::clone(&inventory);
        let outcomes = Arc::clone(&outcomes);
        let sem = Arc::clone(&sem);
        let value = token.value.clone();

        let task = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            let outcome = lookup(inventory.as_ref(), &token, limit).await;
            outcomes.lock().await.push(outcome);
        });

        tasks.push((value, task));
    }

    for (token, task) in tasks {
        if let Err(e) = task.await {
            warn!(token = %token, error = %e, "lookup task aborted");
            outcomes.lock().await.push(LookupOutcome::TransientError {
                token,
                message: RETRY_GUIDANCE.to_string(),
            });
        }
    }

    let collected = std::mem::take(&mut *outcomes.lock().await);
    Resolution::from_outcomes(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use device_inventory::fakes::{device, MemoryInventory};
    use device_inventory::{
        DeviceDetail, DeviceQuery, InventoryResult, SensorInstaller, SortOrder,
    };
    use std::time::Duration;

    /// Delegates to a `MemoryInventory` but panics when searching `poison`.
    struct PanickingInventory {
        inner: MemoryInventory,
        poison: &'static str,
    }

    #[async_trait]
    impl DeviceInventory for PanickingInventory {
        async fn search_devices(&self, query: &DeviceQuery) -> InventoryResult<Vec<DeviceId>> {
            if query.value == self.poison {
                panic!("lookup bug for {}", query.value);
            }
            self.inner.search_devices(query).await
        }

        async fn get_device_details(&self, ids: &[DeviceId]) -> InventoryResult<Vec<DeviceDetail>> {
            self.inner.get_device_details(ids).await
        }

        async fn list_installers(
            &self,
            filter: Option<&str>,
            sort: SortOrder,
        ) -> InventoryResult<Vec<SensorInstaller>> {
            self.inner.list_installers(filter, sort).await
        }

        async fn download_installer(&self, sha256: &str) -> InventoryResult<Vec<u8>> {
            self.inner.download_installer(sha256).await
        }
    }

    fn batch(instance_ids: &[&str], hostnames: &[&str]) -> ClassifiedBatch {
        ClassifiedBatch {
            instance_ids: instance_ids.iter().map(|s| s.to_string()).collect(),
            hostnames: hostnames.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_each_token_yields_one_outcome() {
        let inv = Arc::new(
            MemoryInventory::new()
                .with_device(device("aid-1", "web01"))
                .fail_search_for("flaky"),
        );

        let res = resolve(
            inv.clone(),
            &batch(&[], &["web01", "ghost", "flaky"]),
            &SearchConfig::default(),
        )
        .await;

        assert_eq!(res.identities, vec![DeviceId::new("aid-1")]);
        assert_eq!(res.matched_tokens, 1);
        assert_eq!(res.not_found_count(), 1);
        assert_eq!(res.error_count(), 1);
        assert_eq!(inv.search_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_transient_error_row_carries_guidance() {
        let inv = Arc::new(MemoryInventory::new().fail_search_for("flaky"));

        let res = resolve(inv, &batch(&[], &["flaky"]), &SearchConfig::default()).await;

        assert_eq!(
            res.rows,
            vec![OutputRow::TransientError {
                token: "flaky".to_string(),
                message: RETRY_GUIDANCE.to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_panicking_lookup_is_isolated_to_its_token() {
        let inv = Arc::new(PanickingInventory {
            inner: MemoryInventory::new().with_device(device("aid-1", "web01")),
            poison: "boom",
        });

        let res = resolve(
            inv,
            &batch(&[], &["boom", "web01", "ghost"]),
            &SearchConfig::default().with_concurrency(2),
        )
        .await;

        assert_eq!(res.identities, vec![DeviceId::new("aid-1")]);
        assert_eq!(res.matched_tokens, 1);
        assert_eq!(res.error_count(), 1);
        assert!(res.rows.contains(&OutputRow::TransientError {
            token: "boom".to_string(),
            message: RETRY_GUIDANCE.to_string(),
        }));
        assert!(res.rows.contains(&OutputRow::NotFound {
            token: "ghost".to_string(),
        }));
        assert_eq!(res.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_queries_use_configured_limit() {
        let inv = Arc::new(MemoryInventory::new());
        let config = SearchConfig {
            search_limit: 7,
            ..SearchConfig::default()
        };

        resolve(inv.clone(), &batch(&["i-0abc"], &["web01"]), &config).await;

        let calls = inv.search_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|q| q.limit == 7));
    }

    #[tokio::test]
    async fn test_in_flight_lookups_never_exceed_pool_width() {
        let inv = Arc::new(MemoryInventory::new().with_search_delay(Duration::from_millis(20)));
        let names: Vec<String> = (0..24).map(|i| format!("host{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let config = SearchConfig::default().with_concurrency(4);

        let res = resolve(inv.clone(), &batch(&[], &names), &config).await;

        assert_eq!(res.not_found_count(), 24);
        assert!(inv.peak_concurrency() <= 4);
        assert!(inv.peak_concurrency() > 1);
    }

    #[tokio::test]
    async fn test_duplicate_matches_are_kept_for_aggregation() {
        let inv = Arc::new(MemoryInventory::new().with_device(device("aid-1", "web01")));

        let res = resolve(inv, &batch(&[], &["web01", "web01"]), &SearchConfig::default()).await;

        assert_eq!(res.identities.len(), 2);
        assert_eq!(res.matched_tokens, 2);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_calls() {
        let inv = Arc::new(MemoryInventory::new());
        let res = resolve(inv.clone(), &ClassifiedBatch::default(), &SearchConfig::default()).await;
        assert!(res.identities.is_empty());
        assert!(res.rows.is_empty());
        assert_eq!(inv.total_calls(), 0);
    }
}
