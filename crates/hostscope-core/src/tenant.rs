//! Tenant id to friendly-name directory.
//!
//! Loaded from a flat TOML table:
//!
//! ```toml
//! "1234567890qwertyuiopasdfghjkl" = "Company Name"
//! "0987654321poiuytrewqlkjhgfdsa" = "Business Segment"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{HostscopeError, Result};

/// Name used when a tenant id has no entry.
pub const UNKNOWN_TENANT: &str = "Name not found";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantDirectory {
    names: HashMap<String, String>,
}

impl TenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant_id: &str, name: &str) -> Self {
        self.names.insert(tenant_id.to_string(), name.to_string());
        self
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HostscopeError::TenantDirectory {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| HostscopeError::TenantDirectory {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Friendly name for `tenant_id`, or [`UNKNOWN_TENANT`].
    pub fn friendly_name(&self, tenant_id: &str) -> &str {
        self.names
            .get(tenant_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_TENANT)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for TenantDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
