//! Device-Inventory: remote inventory access for hostscope
//!
//! This crate is the only place that talks to the device inventory service.
//! Everything above it sees the `DeviceInventory` trait.
//!
//! ## Layer 0 - Remote access
//!
//! Focus: wire formats, status handling, and a faithful fake for tests.
//!
//! ## Key Components
//!
//! - `DeviceInventory`: search / detail / installer operations
//! - `HttpInventory`: `reqwest` implementation against the REST API
//! - `fakes::MemoryInventory`: in-memory implementation for tests

mod error;
pub mod fakes;
pub mod http;
pub mod inventory;

pub use error::InventoryError;
pub use http::{HttpInventory, InventoryConfig};
pub use inventory::{
    DeviceDetail, DeviceId, DeviceInventory, DeviceQuery, FilterField, InventoryResult,
    SensorInstaller, SortOrder, MAX_DETAIL_IDS,
};
