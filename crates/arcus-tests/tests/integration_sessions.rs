// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Session Lifecycle Integration Tests
//!
//! Tests of the manual control surface, housekeeping, shutdown and the
//! information queries:
//!
//! - `test_manual_*`: manual connect/disconnect round trips
//! - `test_housekeeping_*`: background reconnection
//! - `test_shutdown_*`: delete-all behaviour
//! - `test_information_*`: read-only snapshots

use arcus_core::error::ClientError;
use arcus_core::types::ClientConnectionId;

use arcus_client::interface::ServerStatus;
use arcus_client::sessions::session::SessionState;

use arcus_tests::common::{ClientEvent, TestClient};

// =============================================================================
// Manual control
// =============================================================================

#[tokio::test]
async fn test_manual_connect_pins_the_session() {
    let client = TestClient::with_servers(&["urn:S"]);

    let connection_id = client
        .factory
        .manually_connect("urn:S", &client.default_settings())
        .await
        .unwrap();

    // Pinned at one, connected, visible in snapshots.
    assert_eq!(client.factory.sessions().activity(connection_id), Some(1));
    let information = client.factory.session_information(connection_id).unwrap();
    assert_eq!(information.session_state, SessionState::Connected);
    assert_eq!(information.server_uri, "urn:S");
}

#[tokio::test]
async fn test_manual_connect_reuses_matching_session() {
    let client = TestClient::with_servers(&["urn:S"]);
    let settings = client.default_settings();

    let first = client.factory.manually_connect("urn:S", &settings).await.unwrap();
    let second = client.factory.manually_connect("urn:S", &settings).await.unwrap();

    // Same session, pinned twice.
    assert_eq!(first, second);
    assert_eq!(client.factory.sessions().activity(first), Some(2));
    assert_eq!(client.transports.transports().len(), 1);
}

#[tokio::test]
async fn test_manual_round_trip_restores_the_table() {
    let client = TestClient::with_servers(&["urn:S"]);
    assert!(client.factory.all_session_informations().is_empty());

    let connection_id = client
        .factory
        .manually_connect("urn:S", &client.default_settings())
        .await
        .unwrap();
    assert_eq!(client.factory.all_session_informations().len(), 1);

    client.factory.manually_disconnect(connection_id).await.unwrap();

    // The pair leaves the table as it was: empty.
    assert!(client.factory.all_session_informations().is_empty());
    let transport = client.transports.transport_for("urn:S").unwrap();
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn test_manual_disconnect_unknown_id() {
    let client = TestClient::new();

    let error = client
        .factory
        .manually_disconnect(ClientConnectionId::new(99))
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::UnknownConnectionId { .. }));
}

#[tokio::test]
async fn test_manual_connect_requires_discovery() {
    let client = TestClient::new();

    let error = client
        .factory
        .manually_connect("urn:never:discovered", &client.default_settings())
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::Discovery { .. }));
}

// =============================================================================
// Housekeeping
// =============================================================================

#[tokio::test]
async fn test_housekeeping_reconnects_referenced_sessions() {
    let client = TestClient::with_servers(&["urn:S"]);

    let connection_id = client
        .factory
        .manually_connect("urn:S", &client.default_settings())
        .await
        .unwrap();

    // The transport loses the connection and reports it.
    let transport = client.transports.transport_for("urn:S").unwrap();
    transport.drop_connection();
    transport
        .emit_status(ServerStatus::ConnectionErrorApiReconnect)
        .await;

    let information = client.factory.session_information(connection_id).unwrap();
    assert_eq!(information.session_state, SessionState::Disconnected);

    // The status change reached the application too.
    assert!(client.interface.events().iter().any(|event| matches!(
        event,
        ClientEvent::StatusChanged {
            status: ServerStatus::ConnectionErrorApiReconnect,
            ..
        }
    )));

    // Housekeeping brings the pinned session back.
    client.factory.do_housekeeping().await;

    let information = client.factory.session_information(connection_id).unwrap();
    assert_eq!(information.session_state, SessionState::Connected);
    assert_eq!(transport.connect_count(), 2);
}

#[tokio::test]
async fn test_housekeeping_ignores_idle_connected_sessions() {
    let client = TestClient::with_servers(&["urn:S"]);

    let connection_id = client
        .factory
        .manually_connect("urn:S", &client.default_settings())
        .await
        .unwrap();

    client.factory.do_housekeeping().await;

    // Nothing to do: still one connect attempt.
    let transport = client.transports.transport_for("urn:S").unwrap();
    assert_eq!(transport.connect_count(), 1);
    assert_eq!(
        client
            .factory
            .session_information(connection_id)
            .unwrap()
            .session_state,
        SessionState::Connected
    );
}

#[tokio::test]
async fn test_status_change_for_destroyed_session_is_dropped() {
    let client = TestClient::with_servers(&["urn:S"]);

    let connection_id = client
        .factory
        .manually_connect("urn:S", &client.default_settings())
        .await
        .unwrap();
    let transport = client.transports.transport_for("urn:S").unwrap();

    client.factory.manually_disconnect(connection_id).await.unwrap();
    client.interface.take_events();

    // The transport still holds the old connection id; its late event
    // must be dropped silently.
    transport.emit_status(ServerStatus::Disconnected).await;
    assert!(client.interface.is_empty());
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn test_shutdown_deletes_all_sessions() {
    let client = TestClient::with_servers(&["urn:A", "urn:B"]);

    // Two pinned sessions; delete_all ignores activity counts.
    client
        .factory
        .manually_connect("urn:A", &client.default_settings())
        .await
        .unwrap();
    client
        .factory
        .manually_connect("urn:B", &client.default_settings())
        .await
        .unwrap();
    assert_eq!(client.factory.all_session_informations().len(), 2);

    client.factory.delete_all_sessions().await;

    assert!(client.factory.all_session_informations().is_empty());
    for transport in client.transports.transports() {
        assert!(!transport.is_connected());
    }
}

// =============================================================================
// Information queries
// =============================================================================

#[tokio::test]
async fn test_information_is_idempotent_between_mutations() {
    let client = TestClient::with_servers(&["urn:S"]);

    let connection_id = client
        .factory
        .manually_connect("urn:S", &client.default_settings())
        .await
        .unwrap();

    let first = client.factory.session_information(connection_id).unwrap();
    let second = client.factory.session_information(connection_id).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_information_unknown_id() {
    let client = TestClient::new();

    let error = client
        .factory
        .session_information(ClientConnectionId::new(5))
        .unwrap_err();

    assert!(matches!(error, ClientError::UnknownConnectionId { .. }));
}

#[tokio::test]
async fn test_acquire_by_id_bumps_activity() {
    let client = TestClient::with_servers(&["urn:S"]);
    let table = client.factory.sessions().clone();

    let connection_id = client
        .factory
        .manually_connect("urn:S", &client.default_settings())
        .await
        .unwrap();

    let lease = table.acquire_by_id(connection_id).unwrap();
    assert_eq!(table.activity(connection_id), Some(2));
    lease.release().await.unwrap();
    assert_eq!(table.activity(connection_id), Some(1));

    let error = table.acquire_by_id(ClientConnectionId::new(999)).unwrap_err();
    assert!(matches!(error, ClientError::UnknownConnectionId { .. }));
}
