//! Detail enrichment.
//!
//! One batched detail fetch for the whole unique identity set, mapped into
//! `DeviceRecord`s in the order the service returns them.

use device_inventory::{DeviceDetail, DeviceId, DeviceInventory};
use tracing::{debug, instrument};

use crate::domain::{DeviceRecord, HostscopeError, Result};
use crate::tenant::TenantDirectory;

pub struct Enricher {
    tenants: TenantDirectory,
}

impl Enricher {
    pub fn new(tenants: TenantDirectory) -> Self {
        Self { tenants }
    }

    /// Map one detail record into the output schema.
    pub fn to_record(&self, detail: DeviceDetail) -> DeviceRecord {
        let tenant_name = self.tenants.friendly_name(&detail.cid).to_string();
        DeviceRecord {
            hostname: detail.hostname,
            found: true,
            agent_version: detail.agent_version,
            last_seen: detail.last_seen,
            first_seen: detail.first_seen,
            tags: detail.tags,
            tenant_id: detail.cid,
            tenant_name,
            instance_id: detail.instance_id,
            device_id: detail.device_id,
        }
    }

    /// Fetch and map details for `identities` in a single call.
    ///
    /// A failed fetch is returned as [`HostscopeError::Enrichment`]; there is
    /// no retry. An empty identity set makes no remote call.
    #[instrument(skip(self, inventory, identities), fields(count = identities.len()))]
    pub async fn enrich(
        &self,
        inventory: &dyn DeviceInventory,
        identities: &[DeviceId],
    ) -> Result<Vec<DeviceRecord>> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        let details = inventory
            .get_device_details(identities)
            .await
            .map_err(|source| HostscopeError::Enrichment {
                requested: identities.len(),
                source,
            })?;

        debug!(returned = details.len(), "details fetched");
        Ok(details.into_iter().map(|d| self.to_record(d)).collect())
    }
}
