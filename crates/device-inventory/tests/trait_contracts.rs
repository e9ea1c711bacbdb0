//! Trait contract tests for DeviceInventory.
//!
//! These tests pin the behaviour the lookup pipeline relies on, using the
//! in-memory fake. Any conforming implementation must satisfy them.

use chrono::{TimeZone, Utc};
use device_inventory::fakes::{device, MemoryInventory};
use device_inventory::{DeviceId, DeviceInventory, DeviceQuery, InventoryError, MAX_DETAIL_IDS};

fn seen_on(day: u32, mut d: device_inventory::DeviceDetail) -> device_inventory::DeviceDetail {
    d.last_seen = Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).single();
    d
}

#[tokio::test]
async fn search_hostname_is_prefix_match() {
    let inv = MemoryInventory::new()
        .with_device(device("aid-1", "web01"))
        .with_device(device("aid-2", "web010"))
        .with_device(device("aid-3", "xweb01"));

    let ids = inv
        .search_devices(&DeviceQuery::hostname("web01", 50))
        .await
        .unwrap();

    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&DeviceId::new("aid-3")));
}

#[tokio::test]
async fn search_instance_id_is_substring_match() {
    let mut d = device("aid-1", "ip-10-0-0-1");
    d.instance_id = Some("i-0aaaaaaaaaaaaaaaa".to_string());
    let inv = MemoryInventory::new().with_device(d);

    let ids = inv
        .search_devices(&DeviceQuery::instance_id("aaaaaaaa", 50))
        .await
        .unwrap();

    assert_eq!(ids, vec![DeviceId::new("aid-1")]);
}

#[tokio::test]
async fn search_returns_freshest_first_within_limit() {
    let inv = MemoryInventory::new()
        .with_device(seen_on(1, device("old", "dup")))
        .with_device(seen_on(9, device("newest", "dup")))
        .with_device(seen_on(5, device("middle", "dup")));

    let ids = inv
        .search_devices(&DeviceQuery::hostname("dup", 2))
        .await
        .unwrap();

    assert_eq!(ids, vec![DeviceId::new("newest"), DeviceId::new("middle")]);
}

#[tokio::test]
async fn search_injected_failure_is_status_error() {
    let inv = MemoryInventory::new().fail_search_for("flaky");

    let err = inv
        .search_devices(&DeviceQuery::hostname("flaky", 50))
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::Status { status: 500, .. }));
    assert_eq!(inv.search_calls().len(), 1);
}

#[tokio::test]
async fn details_follow_request_order_and_skip_unknown() {
    let inv = MemoryInventory::new()
        .with_device(device("aid-1", "a"))
        .with_device(device("aid-2", "b"));

    let details = inv
        .get_device_details(&[
            DeviceId::new("aid-2"),
            DeviceId::new("missing"),
            DeviceId::new("aid-1"),
        ])
        .await
        .unwrap();

    let hosts: Vec<&str> = details.iter().map(|d| d.hostname.as_str()).collect();
    assert_eq!(hosts, vec!["b", "a"]);
    assert_eq!(inv.detail_calls().len(), 1);
}

#[tokio::test]
async fn details_reject_oversized_batch() {
    let inv = MemoryInventory::new();
    let ids: Vec<DeviceId> = (0..MAX_DETAIL_IDS + 1)
        .map(|i| DeviceId::new(format!("aid-{i}")))
        .collect();

    let err = inv.get_device_details(&ids).await.unwrap_err();
    assert!(matches!(err, InventoryError::BatchLimit { .. }));
}

#[tokio::test]
async fn download_unknown_installer_is_not_found() {
    let inv = MemoryInventory::new().with_download("known", b"bytes");

    assert_eq!(inv.download_installer("known").await.unwrap(), b"bytes");
    let err = inv.download_installer("unknown").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
