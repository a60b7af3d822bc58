// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session transport abstraction.
//!
//! Each session owns one transport: the object that actually speaks the
//! wire protocol to one server. The framework never touches sockets
//! itself; everything below the service entry points is behind
//! [`SessionTransport`], which keeps the factory testable and the SDK
//! binding swappable.
//!
//! Completions of asynchronous submissions are not returned by the
//! `begin_*` methods. The transport delivers them later, from its own
//! tasks, through the [`SessionEventSink`] it was given at construction
//! time, identified by the transaction id stamped on the submission.

use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use arcus_core::error::ClientResult;
use arcus_core::settings::{SessionSettings, SubscriptionSettings};
use arcus_core::status::StatusCode;
use arcus_core::types::{
    AttributeId, ClientConnectionId, DataValue, NodeId, TransactionId, UaValue,
};

use crate::discovery::EndpointDescription;
use crate::interface::ServerStatus;

// =============================================================================
// Wire-level operands
// =============================================================================

/// One node/attribute pair to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadValueId {
    /// The node to read.
    pub node_id: NodeId,

    /// The attribute to read.
    pub attribute_id: AttributeId,
}

/// One node/attribute pair to write, with the value to write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteValue {
    /// The node to write.
    pub node_id: NodeId,

    /// The attribute to write.
    pub attribute_id: AttributeId,

    /// The value to write.
    pub value: UaValue,
}

/// One method invocation on one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallMethodRequest {
    /// The object hosting the method.
    pub object_id: NodeId,

    /// The method to call.
    pub method_id: NodeId,

    /// Input arguments.
    pub input_arguments: Vec<UaValue>,
}

/// Result of one method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CallResponse {
    /// Status of the invocation.
    pub status: StatusCode,

    /// Output arguments produced by the method.
    pub output_arguments: Vec<UaValue>,

    /// Per-input-argument results.
    pub input_argument_results: Vec<StatusCode>,
}

/// Diagnostic information attached to a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DiagnosticInfo {
    /// Symbolic id of the diagnostic.
    pub symbolic_id: Option<String>,

    /// Additional free-form information.
    pub additional_info: Option<String>,
}

/// Server-revised parameters of a created subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisedSubscription {
    /// Server-assigned subscription id.
    pub server_subscription_id: u32,

    /// Revised publishing interval.
    pub revised_publishing_interval: Duration,

    /// Revised lifetime count.
    pub revised_lifetime_count: u32,

    /// Revised maximum keep-alive count.
    pub revised_max_keepalive_count: u32,
}

/// One monitored item to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemRequest {
    /// The node to monitor.
    pub node_id: NodeId,

    /// The attribute to monitor.
    pub attribute_id: AttributeId,

    /// Client-side handle echoed in notifications.
    pub client_handle: u32,

    /// Requested sampling interval.
    pub sampling_interval: Duration,

    /// Requested queue size.
    pub queue_size: u32,

    /// Whether to discard the oldest value on queue overflow.
    pub discard_oldest: bool,
}

/// Server response for one created monitored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemResult {
    /// Status of the creation.
    pub status: StatusCode,

    /// Server-assigned monitored item id.
    pub server_item_id: u32,

    /// Revised sampling interval.
    pub revised_sampling_interval: Duration,

    /// Revised queue size.
    pub revised_queue_size: u32,
}

// =============================================================================
// SessionEventSink
// =============================================================================

/// Callback surface the transport delivers events into.
///
/// Implemented by the session factory. Transport tasks run concurrently
/// with dispatcher calls; implementations take short locks only and must
/// tolerate events for sessions or transactions that no longer exist.
#[async_trait]
pub trait SessionEventSink: Send + Sync {
    /// The connection status of a session changed.
    async fn connection_status_changed(
        &self,
        connection_id: ClientConnectionId,
        status: ServerStatus,
    );

    /// An asynchronous read submission completed.
    async fn read_complete(
        &self,
        transaction_id: TransactionId,
        status: StatusCode,
        values: Vec<DataValue>,
        diagnostics: Vec<DiagnosticInfo>,
    );

    /// An asynchronous write submission completed.
    async fn write_complete(
        &self,
        transaction_id: TransactionId,
        status: StatusCode,
        results: Vec<StatusCode>,
        diagnostics: Vec<DiagnosticInfo>,
    );

    /// An asynchronous method-call submission completed.
    async fn call_complete(
        &self,
        transaction_id: TransactionId,
        status: StatusCode,
        responses: Vec<CallResponse>,
    );
}

// =============================================================================
// SessionTransport
// =============================================================================

/// Wire-protocol backend of one session.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The owning session serialises
/// `&mut self` lifecycle calls; `&self` service calls may overlap with
/// event delivery.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Establishes the connection to the given endpoint.
    async fn connect(&mut self, endpoint: &EndpointDescription) -> ClientResult<()>;

    /// Closes the connection.
    async fn disconnect(&mut self) -> ClientResult<()>;

    /// Returns `true` if the transport is currently connected.
    fn is_connected(&self) -> bool;

    /// Reads the given nodes synchronously.
    async fn read(&self, nodes: &[ReadValueId]) -> ClientResult<Vec<DataValue>>;

    /// Writes the given values synchronously.
    async fn write(&self, values: &[WriteValue]) -> ClientResult<Vec<StatusCode>>;

    /// Calls the given methods synchronously.
    async fn call(&self, requests: &[CallMethodRequest]) -> ClientResult<Vec<CallResponse>>;

    /// Submits an asynchronous read; the completion arrives through the
    /// event sink under `transaction_id`.
    async fn begin_read(
        &self,
        transaction_id: TransactionId,
        nodes: &[ReadValueId],
    ) -> ClientResult<()>;

    /// Submits an asynchronous write.
    async fn begin_write(
        &self,
        transaction_id: TransactionId,
        values: &[WriteValue],
    ) -> ClientResult<()>;

    /// Submits an asynchronous method call.
    async fn begin_call(
        &self,
        transaction_id: TransactionId,
        requests: &[CallMethodRequest],
    ) -> ClientResult<()>;

    /// Creates a subscription and returns its revised parameters.
    async fn create_subscription(
        &self,
        settings: &SubscriptionSettings,
    ) -> ClientResult<RevisedSubscription>;

    /// Deletes a subscription.
    async fn delete_subscription(&self, server_subscription_id: u32) -> ClientResult<()>;

    /// Creates monitored items on a subscription. Items live and die with
    /// their subscription; deleting the subscription removes them.
    async fn create_monitored_items(
        &self,
        server_subscription_id: u32,
        items: &[MonitoredItemRequest],
    ) -> ClientResult<Vec<MonitoredItemResult>>;
}

// =============================================================================
// TransportFactory
// =============================================================================

/// Creates one transport per new session.
///
/// The factory hands every transport the callback surface of the session
/// factory as a non-owning reference, together with the connection id the
/// new session was assigned, so the transport can label the events it
/// delivers.
pub trait TransportFactory: Send + Sync {
    /// Creates a transport for a session to `server_uri`.
    fn create(
        &self,
        server_uri: &str,
        connection_id: ClientConnectionId,
        settings: &SessionSettings,
        events: Weak<dyn SessionEventSink>,
    ) -> Box<dyn SessionTransport>;
}
