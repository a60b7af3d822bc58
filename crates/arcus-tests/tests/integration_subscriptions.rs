// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Subscription Integration Tests
//!
//! Tests of the manual subscription surface and the monitored-data
//! pass-through:
//!
//! - `test_manual_*`: manual subscribe/unsubscribe and snapshots
//! - `test_monitored_*`: create-monitored-data dispatch

use arcus_core::error::ClientError;
use arcus_core::settings::SubscriptionSettings;
use arcus_core::types::{ClientSubscriptionHandle, Mask, RequestHandle};

use arcus_client::services::requests::{CreateMonitoredDataRequest, CreateMonitoredDataTarget};
use arcus_client::services::CreateMonitoredDataService;

use arcus_tests::common::{address, TestClient};

// =============================================================================
// Manual subscriptions
// =============================================================================

#[tokio::test]
async fn test_manual_subscribe_and_unsubscribe() {
    let client = TestClient::with_servers(&["urn:S"]);

    let connection_id = client
        .factory
        .manually_connect("urn:S", &client.default_settings())
        .await
        .unwrap();

    let handle = client
        .factory
        .manually_subscribe(connection_id, &SubscriptionSettings::default())
        .await
        .unwrap();

    // Visible in both query surfaces, and the session's activity count
    // is untouched by subscription bookkeeping.
    let information = client.factory.subscription_information(handle).unwrap();
    assert_eq!(information.client_connection_id, connection_id);
    assert_eq!(client.factory.all_subscription_informations().len(), 1);
    assert_eq!(client.factory.sessions().activity(connection_id), Some(1));

    client
        .factory
        .manually_unsubscribe(connection_id, handle)
        .await
        .unwrap();

    assert!(client.factory.all_subscription_informations().is_empty());
    let transport = client.transports.transport_for("urn:S").unwrap();
    assert_eq!(transport.deleted_subscriptions().len(), 1);

    // Unsubscribing again reports the missing handle.
    let error = client
        .factory
        .manually_unsubscribe(connection_id, handle)
        .await
        .unwrap_err();
    assert!(matches!(error, ClientError::UnknownSubscriptionHandle { .. }));
}

#[tokio::test]
async fn test_manual_subscribe_unknown_session() {
    let client = TestClient::new();

    let error = client
        .factory
        .manually_subscribe(
            arcus_core::types::ClientConnectionId::new(3),
            &SubscriptionSettings::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::UnknownConnectionId { .. }));
}

#[tokio::test]
async fn test_subscription_information_unknown_handle() {
    let client = TestClient::new();

    let error = client
        .factory
        .subscription_information(ClientSubscriptionHandle::new(12))
        .unwrap_err();

    assert!(matches!(error, ClientError::UnknownSubscriptionHandle { .. }));
}

// =============================================================================
// Monitored data pass-through
// =============================================================================

#[tokio::test]
async fn test_monitored_data_dispatch() {
    let client = TestClient::with_servers(&["urn:S"]);

    let request = CreateMonitoredDataRequest::new(vec![
        CreateMonitoredDataTarget::new(address("urn:S", 1)),
        CreateMonitoredDataTarget::new(address("urn:S", 2)),
    ])
    .with_request_handle(RequestHandle::new(5));

    let result = client
        .factory
        .invoke::<CreateMonitoredDataService>(&request, &Mask::all(2))
        .await
        .unwrap();

    // Subscription-level requests never bind a transaction at this level.
    assert_eq!(client.factory.pending_transactions(), 0);

    assert_eq!(result.request_handle, RequestHandle::new(5));
    assert_eq!(result.targets.len(), 2);
    for target in &result.targets {
        assert!(target.status.is_good());
        assert!(target.monitored_item_id.is_some());
    }

    // One subscription was created underneath, with both items on it.
    let transport = client.transports.transport_for("urn:S").unwrap();
    assert_eq!(transport.create_subscription_count(), 1);
    assert_eq!(transport.create_monitored_items_count(), 1);

    let informations = client.factory.all_subscription_informations();
    assert_eq!(informations.len(), 1);
    assert_eq!(informations[0].monitored_item_count, 2);
}

#[tokio::test]
async fn test_monitored_data_reuses_matching_subscription() {
    let client = TestClient::with_servers(&["urn:S"]);

    let request = CreateMonitoredDataRequest::new(vec![CreateMonitoredDataTarget::new(
        address("urn:S", 1),
    )]);

    client
        .factory
        .invoke::<CreateMonitoredDataService>(&request, &Mask::all(1))
        .await
        .unwrap();
    client
        .factory
        .invoke::<CreateMonitoredDataService>(&request, &Mask::all(1))
        .await
        .unwrap();

    // Equal settings reuse the subscription instead of creating another.
    let transport = client.transports.transport_for("urn:S").unwrap();
    assert_eq!(transport.create_subscription_count(), 1);
    assert_eq!(transport.create_monitored_items_count(), 2);

    let informations = client.factory.all_subscription_informations();
    assert_eq!(informations.len(), 1);
    assert_eq!(informations[0].monitored_item_count, 2);
}

#[tokio::test]
async fn test_monitored_data_distinct_settings_make_new_subscriptions() {
    let client = TestClient::with_servers(&["urn:S"]);

    let slow = CreateMonitoredDataRequest::new(vec![CreateMonitoredDataTarget::new(
        address("urn:S", 1),
    )]);
    let fast = slow.clone().with_subscription_settings(
        SubscriptionSettings::default()
            .with_publishing_interval(std::time::Duration::from_millis(100)),
    );

    client
        .factory
        .invoke::<CreateMonitoredDataService>(&slow, &Mask::all(1))
        .await
        .unwrap();
    client
        .factory
        .invoke::<CreateMonitoredDataService>(&fast, &Mask::all(1))
        .await
        .unwrap();

    let transport = client.transports.transport_for("urn:S").unwrap();
    assert_eq!(transport.create_subscription_count(), 2);
    assert_eq!(client.factory.all_subscription_informations().len(), 2);
}
