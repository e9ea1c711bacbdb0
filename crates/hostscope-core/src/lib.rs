//! Hostscope Core Library
//!
//! The lookup pipeline (classify, resolve, aggregate, enrich) plus the
//! sensor installer lineage and report rendering used by the CLI.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod enricher;
pub mod lineage;
pub mod obs;
pub mod pipeline;
pub mod reporting;
pub mod resolver;
pub mod telemetry;
pub mod tenant;

pub use domain::{
    ClassifiedBatch, DeviceRecord, HostscopeError, LookupOutcome, OutputRow, Refusal, Result,
    Token, TokenKind, NOT_AVAILABLE, RETRY_GUIDANCE,
};

pub use aggregator::aggregate;
pub use classifier::{strip_domain, Classifier};
pub use config::SearchConfig;
pub use enricher::Enricher;
pub use lineage::{
    build_version_map, normalize_os_alias, os_filter, plan_downloads, DownloadPlan, DownloadStep,
    InstallerRef, NMinus, VersionLineage, VersionMap,
};
pub use pipeline::HostSearch;
pub use resolver::{resolve, Resolution};
pub use telemetry::init_tracing;
pub use tenant::{TenantDirectory, UNKNOWN_TENANT};

pub use device_inventory::{
    DeviceDetail, DeviceId, DeviceInventory, HttpInventory, InventoryConfig, InventoryError,
    SensorInstaller, SortOrder,
};

/// Hostscope version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
