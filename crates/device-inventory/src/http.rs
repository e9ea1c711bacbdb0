//! HTTP inventory client
//!
//! Talks to the device inventory REST API with `reqwest`. Authentication is
//! not negotiated here: the caller supplies an already-issued bearer token.

use crate::error::InventoryError;
use crate::inventory::{
    DeviceDetail, DeviceId, DeviceInventory, DeviceQuery, InventoryResult, SensorInstaller,
    SortOrder, MAX_DETAIL_IDS,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEVICE_SEARCH_PATH: &str = "/devices/queries/devices-scroll/v1";
const DEVICE_DETAILS_PATH: &str = "/devices/entities/devices/v2";
const INSTALLERS_PATH: &str = "/sensors/combined/installers/v1";
const INSTALLER_DOWNLOAD_PATH: &str = "/sensors/entities/download-installer/v1";

/// Inventory client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Pre-issued bearer token
    pub token: Option<String>,
    /// Per-request timeout enforced by the transport
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        InventoryConfig {
            base_url: std::env::var("HOSTSCOPE_API_BASE")
                .unwrap_or_else(|_| "https://api.crowdstrike.com".to_string()),
            token: std::env::var("HOSTSCOPE_API_TOKEN").ok(),
            timeout_secs: std::env::var("HOSTSCOPE_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            user_agent: format!("hostscope/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl InventoryConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific server
    pub fn new(base_url: &str) -> Self {
        InventoryConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            timeout_secs: 60,
            user_agent: format!("hostscope/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// Standard response envelope; `resources` may be `null` on empty results.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    resources: Option<Vec<T>>,
}

impl<T> Envelope<T> {
    fn into_resources(self) -> Vec<T> {
        self.resources.unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct IdsBody<'a> {
    ids: &'a [DeviceId],
}

/// `DeviceInventory` backed by the REST API
pub struct HttpInventory {
    config: InventoryConfig,
    http_client: reqwest::Client,
}

impl HttpInventory {
    /// Create a new client
    pub fn new(config: InventoryConfig) -> InventoryResult<Self> {
        if config.base_url.is_empty() {
            return Err(InventoryError::Config("base_url must not be empty".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpInventory {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> InventoryResult<Self> {
        Self::new(InventoryConfig::from_env())
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-success response into `InventoryError::Status`.
    async fn check(endpoint: &str, response: reqwest::Response) -> InventoryResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(InventoryError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl DeviceInventory for HttpInventory {
    #[instrument(skip(self), fields(filter = %query.filter_expression()))]
    async fn search_devices(&self, query: &DeviceQuery) -> InventoryResult<Vec<DeviceId>> {
        let limit = query.limit.to_string();
        let request = self.http_client.get(self.url(DEVICE_SEARCH_PATH)).query(&[
            ("filter", query.filter_expression().as_str()),
            ("limit", limit.as_str()),
            ("sort", query.sort.as_str()),
        ]);

        let response = Self::check(DEVICE_SEARCH_PATH, self.authorize(request).send().await?).await?;
        let ids = response.json::<Envelope<DeviceId>>().await?.into_resources();
        debug!(matched = ids.len(), "device search complete");
        Ok(ids)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_device_details(&self, ids: &[DeviceId]) -> InventoryResult<Vec<DeviceDetail>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_DETAIL_IDS {
            return Err(InventoryError::BatchLimit {
                requested: ids.len(),
                limit: MAX_DETAIL_IDS,
            });
        }

        let request = self
            .http_client
            .post(self.url(DEVICE_DETAILS_PATH))
            .json(&IdsBody { ids });

        let response = Self::check(DEVICE_DETAILS_PATH, self.authorize(request).send().await?).await?;
        let details = response.json::<Envelope<DeviceDetail>>().await?.into_resources();
        debug!(returned = details.len(), "device details fetched");
        Ok(details)
    }

    #[instrument(skip(self))]
    async fn list_installers(
        &self,
        filter: Option<&str>,
        sort: SortOrder,
    ) -> InventoryResult<Vec<SensorInstaller>> {
        let mut request = self
            .http_client
            .get(self.url(INSTALLERS_PATH))
            .query(&[("sort", sort.as_str())]);
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            request = request.query(&[("filter", filter)]);
        }

        let response = Self::check(INSTALLERS_PATH, self.authorize(request).send().await?).await?;
        Ok(response.json::<Envelope<SensorInstaller>>().await?.into_resources())
    }

    #[instrument(skip(self))]
    async fn download_installer(&self, sha256: &str) -> InventoryResult<Vec<u8>> {
        let request = self
            .http_client
            .get(self.url(INSTALLER_DOWNLOAD_PATH))
            .query(&[("id", sha256)]);

        let response =
            Self::check(INSTALLER_DOWNLOAD_PATH, self.authorize(request).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
