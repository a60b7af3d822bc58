// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Dispatcher Integration Tests
//!
//! End-to-end tests of request dispatch through the session factory:
//!
//! - Synchronous reads and writes, single server and fan-out
//! - Asynchronous submission, completion routing, and rollback
//! - Activity-count accounting around dispatch
//!
//! ## Test Categories
//!
//! - `test_sync_*`: synchronous dispatch
//! - `test_async_*`: asynchronous dispatch and completion routing
//! - `test_release_*`: activity-count edge cases

use arcus_core::error::ClientError;
use arcus_core::status::StatusCode;
use arcus_core::types::{DataValue, Mask, RequestHandle, TransactionId, UaValue};

use arcus_client::services::requests::{MethodCallRequest, ReadRequest, WriteRequest};
use arcus_client::services::{
    AsyncMethodCallService, AsyncReadService, MethodCallService, ReadService, WriteService,
};
use arcus_client::transport::{CallResponse, SessionEventSink};

use arcus_tests::common::{call_target, read_target, write_target, TestClient};

// =============================================================================
// Synchronous dispatch
// =============================================================================

#[tokio::test]
async fn test_sync_read_single_server() {
    let client = TestClient::with_servers(&["urn:S"]);
    for node in [1, 2, 3] {
        client.seed_value("urn:S", node, UaValue::Int32(node as i32));
    }

    let request = ReadRequest::new(vec![
        read_target("urn:S", 1),
        read_target("urn:S", 2),
        read_target("urn:S", 3),
    ]);

    let result = client
        .factory
        .invoke::<ReadService>(&request, &Mask::all(3))
        .await
        .unwrap();

    assert_eq!(result.targets.len(), 3);
    for (index, target) in result.targets.iter().enumerate() {
        assert!(target.status.is_good(), "target {} not good", index);
        assert_eq!(target.value, Some(UaValue::Int32(index as i32 + 1)));
    }

    // One server, one session, one wire read.
    let transports = client.transports.transports();
    assert_eq!(transports.len(), 1);
    assert_eq!(transports[0].read_count(), 1);

    // The session survives the request for reuse, idle.
    let informations = client.factory.all_session_informations();
    assert_eq!(informations.len(), 1);
    assert_eq!(
        client
            .factory
            .sessions()
            .activity(informations[0].client_connection_id),
        Some(0)
    );
}

#[tokio::test]
async fn test_sync_read_fan_out() {
    let client = TestClient::with_servers(&["urn:A", "urn:B", "urn:C"]);
    for (uri, node) in [("urn:A", 1), ("urn:A", 2), ("urn:B", 3), ("urn:C", 4)] {
        client.seed_value(uri, node, UaValue::Boolean(true));
    }

    let request = ReadRequest::new(vec![
        read_target("urn:A", 1),
        read_target("urn:A", 2),
        read_target("urn:B", 3),
        read_target("urn:C", 4),
    ]);

    let result = client
        .factory
        .invoke::<ReadService>(&request, &Mask::all(4))
        .await
        .unwrap();

    // Three invocations, one per server; all four targets populated at
    // their original indices.
    assert_eq!(client.transports.transports().len(), 3);
    assert_eq!(result.targets.len(), 4);
    assert!(result.targets.iter().all(|t| t.status.is_good()));

    // Server A got both of its targets in one wire read.
    let a = client.transports.transport_for("urn:A").unwrap();
    assert_eq!(a.read_count(), 1);

    // Every session is idle again.
    for information in client.factory.all_session_informations() {
        assert_eq!(
            client
                .factory
                .sessions()
                .activity(information.client_connection_id),
            Some(0)
        );
    }
}

#[tokio::test]
async fn test_sync_read_mask_excludes_targets() {
    let client = TestClient::with_servers(&["urn:S"]);
    client.seed_value("urn:S", 1, UaValue::Int32(1));
    client.seed_value("urn:S", 3, UaValue::Int32(3));

    let request = ReadRequest::new(vec![
        read_target("urn:S", 1),
        read_target("urn:S", 2),
        read_target("urn:S", 3),
    ]);

    let mut mask = Mask::new(3);
    mask.set(0);
    mask.set(2);

    let result = client
        .factory
        .invoke::<ReadService>(&request, &mask)
        .await
        .unwrap();

    assert!(result.targets[0].status.is_good());
    assert_eq!(result.targets[1].status, StatusCode::UNCERTAIN_INITIAL_VALUE);
    assert!(result.targets[2].status.is_good());
}

#[tokio::test]
async fn test_sync_write_reaches_the_server() {
    let client = TestClient::with_servers(&["urn:S"]);

    let request = WriteRequest::new(vec![
        write_target("urn:S", 1, UaValue::Double(21.5)),
        write_target("urn:S", 2, UaValue::Boolean(false)),
    ]);

    let result = client
        .factory
        .invoke::<WriteService>(&request, &Mask::all(2))
        .await
        .unwrap();

    assert!(result.targets.iter().all(|t| t.status.is_good()));

    let transport = client.transports.transport_for("urn:S").unwrap();
    let history = transport.write_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].value, UaValue::Double(21.5));
}

#[tokio::test]
async fn test_sync_call_round_trip() {
    let client = TestClient::with_servers(&["urn:S"]);

    let request = MethodCallRequest::new(vec![call_target("urn:S", 10, 11)]);
    let result = client
        .factory
        .invoke::<MethodCallService>(&request, &Mask::all(1))
        .await
        .unwrap();

    assert_eq!(result.targets.len(), 1);
    assert!(result.targets[0].status.is_good());
    // The mock echoes input arguments as outputs.
    assert_eq!(result.targets[0].output_arguments, vec![UaValue::Int32(1)]);
}

#[tokio::test]
async fn test_sync_failure_stops_further_invocations() {
    let client = TestClient::with_servers(&["urn:A", "urn:B"]);
    client.transports.fail_connections_to("urn:A");

    let request = ReadRequest::new(vec![read_target("urn:A", 1), read_target("urn:B", 2)]);

    let error = client
        .factory
        .invoke::<ReadService>(&request, &Mask::all(2))
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::NotConnected { .. }));

    // Invocations iterate in server-URI order, so the failure on A must
    // have prevented any work on B: no session, no transport.
    assert!(client.transports.transport_for("urn:B").is_none());
}

#[tokio::test]
async fn test_discovery_miss_is_a_hard_failure() {
    let client = TestClient::with_servers(&["urn:known"]);

    let request = ReadRequest::new(vec![read_target("urn:unknown", 1)]);
    let error = client
        .factory
        .invoke::<ReadService>(&request, &Mask::all(1))
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::Discovery { .. }));
    assert!(client.factory.all_session_informations().is_empty());
}

// =============================================================================
// Asynchronous dispatch
// =============================================================================

#[tokio::test]
async fn test_async_fan_out_is_unsupported() {
    let client = TestClient::with_servers(&["urn:A", "urn:B"]);

    let request = MethodCallRequest::new(vec![
        call_target("urn:A", 10, 11),
        call_target("urn:B", 10, 11),
    ])
    .with_request_handle(RequestHandle::new(7));

    let error = client
        .factory
        .invoke::<AsyncMethodCallService>(&request, &Mask::all(2))
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::Unsupported { .. }));

    // The transaction allocated up front was erased again, and nothing
    // was forwarded to any session.
    assert_eq!(client.factory.pending_transactions(), 0);
    assert!(client.transports.transports().is_empty());
}

#[tokio::test]
async fn test_async_call_happy_path() {
    let client = TestClient::with_servers(&["urn:A"]);

    let request = MethodCallRequest::new(vec![
        call_target("urn:A", 10, 11),
        call_target("urn:A", 20, 21),
        call_target("urn:A", 30, 31),
    ])
    .with_request_handle(RequestHandle::new(42));

    let result = client
        .factory
        .invoke::<AsyncMethodCallService>(&request, &Mask::all(3))
        .await
        .unwrap();

    // The synchronous result only reports submission.
    assert_eq!(result.targets.len(), 3);
    assert!(result
        .targets
        .iter()
        .all(|t| t.status == StatusCode::GOOD_COMPLETES_ASYNCHRONOUSLY));

    // The session received the submission with a bound transaction.
    let transport = client.transports.transport_for("urn:A").unwrap();
    assert_eq!(transport.begin_call_count(), 1);
    let transaction_id = transport.last_transaction_id().unwrap();
    assert_eq!(client.factory.pending_transactions(), 1);

    // The transport delivers the completion; the router resolves it to
    // the original request handle.
    client
        .factory
        .call_complete(
            transaction_id,
            StatusCode::GOOD,
            vec![CallResponse::default(); 3],
        )
        .await;

    let completions = client.interface.call_completes();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].request_handle, RequestHandle::new(42));
    assert!(completions[0].overall_status.is_good());
    assert_eq!(completions[0].targets.len(), 3);

    // The binding is consumed.
    assert_eq!(client.factory.pending_transactions(), 0);
}

#[tokio::test]
async fn test_async_read_completion_routing() {
    let client = TestClient::with_servers(&["urn:A"]);

    let request = ReadRequest::new(vec![read_target("urn:A", 1), read_target("urn:A", 2)])
        .with_request_handle(RequestHandle::new(9));

    client
        .factory
        .invoke::<AsyncReadService>(&request, &Mask::all(2))
        .await
        .unwrap();

    let transport = client.transports.transport_for("urn:A").unwrap();
    assert_eq!(transport.begin_read_count(), 1);
    let transaction_id = transport.last_transaction_id().unwrap();

    client
        .factory
        .read_complete(
            transaction_id,
            StatusCode::GOOD,
            vec![
                DataValue::good(UaValue::Int32(5)),
                DataValue::bad(StatusCode::BAD_NODE_ID_UNKNOWN),
            ],
            Vec::new(),
        )
        .await;

    let completions = client.interface.read_completes();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].request_handle, RequestHandle::new(9));
    assert_eq!(completions[0].targets.len(), 2);
    assert!(completions[0].targets[0].status.is_good());
    assert!(completions[0].targets[1].status.is_bad());
}

#[tokio::test]
async fn test_async_rollback_drops_late_completion() {
    let client = TestClient::with_servers(&["urn:A"]);
    client.transports.fail_connections_to("urn:A");

    let request = MethodCallRequest::new(vec![call_target("urn:A", 10, 11)])
        .with_request_handle(RequestHandle::new(42));

    // The session is acquired but never connects, so the invocation is
    // refused after the transaction was bound.
    let error = client
        .factory
        .invoke::<AsyncMethodCallService>(&request, &Mask::all(1))
        .await
        .unwrap_err();
    assert!(matches!(error, ClientError::NotConnected { .. }));

    // Rollback erased the binding.
    assert_eq!(client.factory.pending_transactions(), 0);
    let transport = client.transports.transport_for("urn:A").unwrap();
    assert_eq!(transport.begin_call_count(), 0);

    // A late completion for the rolled-back transaction (the factory
    // allocates ids from 1) is dropped without reaching the application.
    client
        .factory
        .call_complete(TransactionId::new(1), StatusCode::GOOD, Vec::new())
        .await;

    assert!(client.interface.call_completes().is_empty());
}

#[tokio::test]
async fn test_unknown_transaction_completion_is_dropped() {
    let client = TestClient::with_servers(&["urn:A"]);

    client
        .factory
        .read_complete(TransactionId::new(999), StatusCode::GOOD, Vec::new(), Vec::new())
        .await;

    assert!(client.interface.is_empty());
}

// =============================================================================
// Release accounting
// =============================================================================

#[tokio::test]
async fn test_release_underflow_is_surfaced() {
    let client = TestClient::with_servers(&["urn:S"]);
    let table = client.factory.sessions().clone();

    let lease = table
        .acquire_by_match("urn:S", &client.default_settings())
        .await
        .unwrap();
    let session = lease.session().clone();
    let connection_id = session.client_connection_id();

    lease.release().await.unwrap();
    assert_eq!(table.activity(connection_id), Some(0));

    // Releasing again is a programming error, surfaced without underflow
    // and without freeing the session twice.
    let error = table.release(&session, true).await.unwrap_err();
    assert!(matches!(error, ClientError::ReleaseUnderflow { .. }));
    assert_eq!(table.activity(connection_id), Some(0));
    assert_eq!(table.len(), 1);
}

#[tokio::test]
async fn test_dispatch_leaves_no_leaked_activity() {
    let client = TestClient::with_servers(&["urn:A", "urn:B"]);
    client.seed_value("urn:A", 1, UaValue::Int32(1));
    client.seed_value("urn:B", 2, UaValue::Int32(2));

    let request = ReadRequest::new(vec![read_target("urn:A", 1), read_target("urn:B", 2)]);

    for _ in 0..3 {
        client
            .factory
            .invoke::<ReadService>(&request, &Mask::all(2))
            .await
            .unwrap();
    }

    // Sessions were reused across calls, and every acquire was matched by
    // a release.
    assert_eq!(client.factory.all_session_informations().len(), 2);
    for information in client.factory.all_session_informations() {
        assert_eq!(
            client
                .factory
                .sessions()
                .activity(information.client_connection_id),
            Some(0)
        );
    }
    assert_eq!(client.transports.transports().len(), 2);

    let event_count = client.interface.len();
    assert_eq!(event_count, 0, "synchronous dispatch must not touch the interface");
}
