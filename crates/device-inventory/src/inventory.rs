//! Inventory trait definitions for hostscope
//!
//! `DeviceInventory` is the single seam between the lookup pipeline and the
//! remote service. It covers:
//! - partial-match device search (`search_devices`)
//! - batched detail fetch (`get_device_details`)
//! - sensor installer catalog listing and download
//!
//! The HTTP implementation lives in `http`; in-memory fakes for tests live in
//! `fakes`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// Result type for inventory operations
pub type InventoryResult<T> = std::result::Result<T, InventoryError>;

/// Largest id batch accepted by a single detail fetch.
pub const MAX_DETAIL_IDS: usize = 5000;

// ---------------------------------------------------------------------------
// Device search
// ---------------------------------------------------------------------------

/// Opaque unique handle of a device (the agent id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        DeviceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field a partial-match query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    InstanceId,
    Hostname,
}

/// Server-side sort applied to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Most recently seen devices first
    LastSeenDesc,
    /// Newest installers first
    ReleaseDateDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::LastSeenDesc => "last_seen.desc",
            SortOrder::ReleaseDateDesc => "release_date.desc",
        }
    }
}

/// A wildcard query for devices on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceQuery {
    pub field: FilterField,
    pub value: String,
    pub limit: usize,
    pub sort: SortOrder,
}

impl DeviceQuery {
    /// Query matching instance ids that contain `value`.
    pub fn instance_id(value: &str, limit: usize) -> Self {
        Self {
            field: FilterField::InstanceId,
            value: value.to_string(),
            limit,
            sort: SortOrder::LastSeenDesc,
        }
    }

    /// Query matching hostnames that start with `value`.
    pub fn hostname(value: &str, limit: usize) -> Self {
        Self {
            field: FilterField::Hostname,
            value: value.to_string(),
            limit,
            sort: SortOrder::LastSeenDesc,
        }
    }

    /// Render the service-side filter expression.
    ///
    /// Instance ids match anywhere in the field; hostnames are anchored at
    /// the start so short names do not sweep up unrelated machines.
    pub fn filter_expression(&self) -> String {
        let value = escape_filter_value(&self.value);
        match self.field {
            FilterField::InstanceId => format!("instance_id:*'*{value}*'"),
            FilterField::Hostname => format!("hostname:*'{value}*'"),
        }
    }
}

/// Backslash-escape characters that would end a quoted filter literal.
fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Full detail record for one device as returned by the service.
///
/// Fields the service may omit are `Option`; callers decide the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDetail {
    pub device_id: DeviceId,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub agent_version: String,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub instance_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Sensor installers
// ---------------------------------------------------------------------------

/// One downloadable sensor installer from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInstaller {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub file_type: Option<String>,
}

// ---------------------------------------------------------------------------
// DeviceInventory
// ---------------------------------------------------------------------------

/// Remote device inventory.
///
/// Guarantees expected from implementations:
/// - `search_devices` returns at most `query.limit` ids, ordered by `query.sort`.
/// - A non-success answer surfaces as `InventoryError::Status`, never as an
///   empty result.
/// - `get_device_details` accepts up to [`MAX_DETAIL_IDS`] ids in one call
///   and preserves the service's return order.
#[async_trait]
pub trait DeviceInventory: Send + Sync {
    /// Run a partial-match query and return the matching device ids.
    async fn search_devices(&self, query: &DeviceQuery) -> InventoryResult<Vec<DeviceId>>;

    /// Fetch detail records for a batch of device ids in one call.
    async fn get_device_details(&self, ids: &[DeviceId]) -> InventoryResult<Vec<DeviceDetail>>;

    /// List sensor installers, optionally narrowed by a filter expression.
    async fn list_installers(
        &self,
        filter: Option<&str>,
        sort: SortOrder,
    ) -> InventoryResult<Vec<SensorInstaller>>;

    /// Download an installer binary by its sha256.
    async fn download_installer(&self, sha256: &str) -> InventoryResult<Vec<u8>>;
}
