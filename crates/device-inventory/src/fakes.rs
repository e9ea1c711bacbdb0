//! In-memory fakes for the inventory trait (testing only)
//!
//! `MemoryInventory` answers searches and detail fetches from a fixed device
//! list, records every call it receives, and can be told to fail specific
//! tokens or the detail fetch.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::error::InventoryError;
use crate::inventory::*;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a device detail with plausible defaults.
pub fn device(device_id: &str, hostname: &str) -> DeviceDetail {
    DeviceDetail {
        device_id: DeviceId::new(device_id),
        hostname: hostname.to_string(),
        agent_version: "7.10.17706.0".to_string(),
        last_seen: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single(),
        first_seen: Utc.with_ymd_and_hms(2023, 1, 15, 8, 30, 0).single(),
        tags: None,
        cid: String::new(),
        instance_id: None,
    }
}

// ---------------------------------------------------------------------------
// MemoryInventory
// ---------------------------------------------------------------------------

/// In-memory device inventory.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    devices: Vec<DeviceDetail>,
    installers: Vec<SensorInstaller>,
    downloads: HashMap<String, Vec<u8>>,
    failing_tokens: HashSet<String>,
    fail_details: bool,
    search_delay: Option<Duration>,
    search_calls: Mutex<Vec<DeviceQuery>>,
    detail_calls: Mutex<Vec<Vec<DeviceId>>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, detail: DeviceDetail) -> Self {
        self.devices.push(detail);
        self
    }

    pub fn with_devices(mut self, details: impl IntoIterator<Item = DeviceDetail>) -> Self {
        self.devices.extend(details);
        self
    }

    /// Searches for `token` answer with a 500 status.
    pub fn fail_search_for(mut self, token: &str) -> Self {
        self.failing_tokens.insert(token.to_string());
        self
    }

    /// The detail fetch answers with a 503 status.
    pub fn fail_details(mut self) -> Self {
        self.fail_details = true;
        self
    }

    /// Hold every search open for `delay` so concurrent calls overlap.
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn with_installer(mut self, installer: SensorInstaller) -> Self {
        self.installers.push(installer);
        self
    }

    pub fn with_download(mut self, sha256: &str, bytes: &[u8]) -> Self {
        self.downloads.insert(sha256.to_string(), bytes.to_vec());
        self
    }

    /// Every search query received, in arrival order.
    pub fn search_calls(&self) -> Vec<DeviceQuery> {
        lock(&self.search_calls).clone()
    }

    /// Every detail batch received.
    pub fn detail_calls(&self) -> Vec<Vec<DeviceId>> {
        lock(&self.detail_calls).clone()
    }

    /// Total remote calls of any kind.
    pub fn total_calls(&self) -> usize {
        lock(&self.search_calls).len() + lock(&self.detail_calls).len()
    }

    /// Highest number of searches observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn matches(query: &DeviceQuery, detail: &DeviceDetail) -> bool {
        let needle = query.value.to_lowercase();
        match query.field {
            FilterField::InstanceId => detail
                .instance_id
                .as_deref()
                .is_some_and(|id| id.to_lowercase().contains(&needle)),
            FilterField::Hostname => detail.hostname.to_lowercase().starts_with(&needle),
        }
    }

    fn run_search(&self, query: &DeviceQuery) -> InventoryResult<Vec<DeviceId>> {
        if self.failing_tokens.contains(&query.value) {
            return Err(InventoryError::Status {
                endpoint: "search_devices".to_string(),
                status: 500,
                message: "injected failure".to_string(),
            });
        }

        let mut hits: Vec<&DeviceDetail> = self
            .devices
            .iter()
            .filter(|d| Self::matches(query, d))
            .collect();
        if query.sort == SortOrder::LastSeenDesc {
            hits.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        }
        Ok(hits
            .into_iter()
            .take(query.limit)
            .map(|d| d.device_id.clone())
            .collect())
    }
}

#[async_trait]
impl DeviceInventory for MemoryInventory {
    async fn search_devices(&self, query: &DeviceQuery) -> InventoryResult<Vec<DeviceId>> {
        lock(&self.search_calls).push(query.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.run_search(query);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_device_details(&self, ids: &[DeviceId]) -> InventoryResult<Vec<DeviceDetail>> {
        lock(&self.detail_calls).push(ids.to_vec());

        if self.fail_details {
            return Err(InventoryError::Status {
                endpoint: "get_device_details".to_string(),
                status: 503,
                message: "injected failure".to_string(),
            });
        }
        if ids.len() > MAX_DETAIL_IDS {
            return Err(InventoryError::BatchLimit {
                requested: ids.len(),
                limit: MAX_DETAIL_IDS,
            });
        }

        let by_id: HashMap<&DeviceId, &DeviceDetail> =
            self.devices.iter().map(|d| (&d.device_id, d)).collect();
        Ok(ids
            .iter()
            .filter_map(|id| by_id.get(id).map(|d| (*d).clone()))
            .collect())
    }

    async fn list_installers(
        &self,
        filter: Option<&str>,
        sort: SortOrder,
    ) -> InventoryResult<Vec<SensorInstaller>> {
        // Only `os:'<name>'` filters are understood.
        let os = filter
            .and_then(|f| f.strip_prefix("os:'"))
            .and_then(|f| f.strip_suffix('\''));

        let mut out: Vec<SensorInstaller> = self
            .installers
            .iter()
            .filter(|i| os.is_none() || i.os.as_deref() == os)
            .cloned()
            .collect();
        if sort == SortOrder::ReleaseDateDesc {
            out.sort_by(|a, b| b.release_date.cmp(&a.release_date));
        }
        Ok(out)
    }

    async fn download_installer(&self, sha256: &str) -> InventoryResult<Vec<u8>> {
        self.downloads
            .get(sha256)
            .cloned()
            .ok_or_else(|| InventoryError::Status {
                endpoint: "download_installer".to_string(),
                status: 404,
                message: format!("no installer {sha256}"),
            })
    }
}
