// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Mock transports and a recording client interface for testing the
//! session factory in isolation.
//!
//! ## Design Principles
//!
//! - Configurable behavior for different test scenarios
//! - Recording of interactions for verification
//! - Thread-safe for concurrent testing
//! - Easy to set up error injection

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use arcus_core::error::{ClientError, ClientResult};
use arcus_core::settings::{SessionSettings, SubscriptionSettings};
use arcus_core::status::StatusCode;
use arcus_core::types::{ClientConnectionId, DataValue, NodeId, TransactionId, UaValue};

use arcus_client::discovery::EndpointDescription;
use arcus_client::interface::{ClientInterface, ServerStatus};
use arcus_client::services::results::{MethodCallResult, ReadResult, WriteResult};
use arcus_client::sessions::session::SessionInformation;
use arcus_client::transport::{
    CallMethodRequest, CallResponse, MonitoredItemRequest, MonitoredItemResult, ReadValueId,
    RevisedSubscription, SessionEventSink, SessionTransport, TransportFactory, WriteValue,
};

// =============================================================================
// Mock Transport
// =============================================================================

/// Shared state of one mock transport, kept alive by both the transport
/// handed to the session and the test that inspects it.
pub struct MockTransportState {
    /// Server URI the transport was created for.
    pub server_uri: String,

    /// Connection id of the owning session.
    pub connection_id: ClientConnectionId,

    /// Callback surface of the session factory, for synthetic events.
    events: Mutex<Weak<dyn SessionEventSink>>,

    /// Node values served to reads.
    values: RwLock<HashMap<NodeId, UaValue>>,

    /// Connection state.
    connected: AtomicBool,

    /// Force connect attempts to fail.
    fail_connect: AtomicBool,

    /// Force service calls to fail.
    fail_services: AtomicBool,

    /// Operation counters.
    connect_count: AtomicU64,
    disconnect_count: AtomicU64,
    read_count: AtomicU64,
    write_count: AtomicU64,
    call_count: AtomicU64,
    begin_read_count: AtomicU64,
    begin_write_count: AtomicU64,
    begin_call_count: AtomicU64,

    /// Transaction id of the last asynchronous submission.
    last_transaction_id: Mutex<Option<TransactionId>>,

    /// Every value written, in order.
    write_history: Mutex<Vec<WriteValue>>,

    /// Server-side subscription id allocator.
    next_subscription_id: AtomicU32,

    /// Server-side monitored item id allocator.
    next_item_id: AtomicU32,

    /// Subscription counters.
    create_subscription_count: AtomicU64,
    deleted_subscriptions: Mutex<Vec<u32>>,
    create_monitored_items_count: AtomicU64,
}

impl MockTransportState {
    fn new(
        server_uri: &str,
        connection_id: ClientConnectionId,
        events: Weak<dyn SessionEventSink>,
    ) -> Self {
        Self {
            server_uri: server_uri.to_string(),
            connection_id,
            events: Mutex::new(events),
            values: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            fail_services: AtomicBool::new(false),
            connect_count: AtomicU64::new(0),
            disconnect_count: AtomicU64::new(0),
            read_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
            call_count: AtomicU64::new(0),
            begin_read_count: AtomicU64::new(0),
            begin_write_count: AtomicU64::new(0),
            begin_call_count: AtomicU64::new(0),
            last_transaction_id: Mutex::new(None),
            write_history: Mutex::new(Vec::new()),
            next_subscription_id: AtomicU32::new(100),
            next_item_id: AtomicU32::new(1000),
            create_subscription_count: AtomicU64::new(0),
            deleted_subscriptions: Mutex::new(Vec::new()),
            create_monitored_items_count: AtomicU64::new(0),
        }
    }

    /// Sets a value served to reads of `node_id`.
    pub fn set_value(&self, node_id: NodeId, value: UaValue) {
        self.values.write().insert(node_id, value);
    }

    /// Returns `true` if the transport is connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Forces connect attempts to fail (or succeed again).
    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Forces service calls to fail (or succeed again).
    pub fn fail_services(&self, fail: bool) {
        self.fail_services.store(fail, Ordering::SeqCst);
    }

    /// Simulates a connection loss without going through the session.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Delivers a synthetic connection status event to the factory.
    pub async fn emit_status(&self, status: ServerStatus) {
        let events = self.events.lock().clone();
        if let Some(sink) = events.upgrade() {
            sink.connection_status_changed(self.connection_id, status).await;
        }
    }

    /// Returns the transaction id of the last asynchronous submission.
    pub fn last_transaction_id(&self) -> Option<TransactionId> {
        *self.last_transaction_id.lock()
    }

    /// Returns the write history.
    pub fn write_history(&self) -> Vec<WriteValue> {
        self.write_history.lock().clone()
    }

    /// Returns the deleted server subscription ids.
    pub fn deleted_subscriptions(&self) -> Vec<u32> {
        self.deleted_subscriptions.lock().clone()
    }

    /// Returns the connect count.
    pub fn connect_count(&self) -> u64 {
        self.connect_count.load(Ordering::SeqCst)
    }

    /// Returns the disconnect count.
    pub fn disconnect_count(&self) -> u64 {
        self.disconnect_count.load(Ordering::SeqCst)
    }

    /// Returns the synchronous read count.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::SeqCst)
    }

    /// Returns the synchronous write count.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Returns the synchronous call count.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Returns the asynchronous read submission count.
    pub fn begin_read_count(&self) -> u64 {
        self.begin_read_count.load(Ordering::SeqCst)
    }

    /// Returns the asynchronous write submission count.
    pub fn begin_write_count(&self) -> u64 {
        self.begin_write_count.load(Ordering::SeqCst)
    }

    /// Returns the asynchronous call submission count.
    pub fn begin_call_count(&self) -> u64 {
        self.begin_call_count.load(Ordering::SeqCst)
    }

    /// Returns the create-subscription count.
    pub fn create_subscription_count(&self) -> u64 {
        self.create_subscription_count.load(Ordering::SeqCst)
    }

    /// Returns the create-monitored-items count.
    pub fn create_monitored_items_count(&self) -> u64 {
        self.create_monitored_items_count.load(Ordering::SeqCst)
    }

    fn check_service(&self) -> ClientResult<()> {
        if !self.is_connected() {
            return Err(ClientError::transport_status(
                "mock transport is not connected",
                StatusCode::BAD_SERVER_NOT_CONNECTED,
            ));
        }
        if self.fail_services.load(Ordering::SeqCst) {
            return Err(ClientError::transport("mock service failure"));
        }
        Ok(())
    }

    fn record_submission(&self, transaction_id: TransactionId) {
        *self.last_transaction_id.lock() = Some(transaction_id);
    }
}

/// A mock transport driven entirely by its shared [`MockTransportState`].
pub struct MockTransport {
    state: Arc<MockTransportState>,
}

#[async_trait]
impl SessionTransport for MockTransport {
    async fn connect(&mut self, _endpoint: &EndpointDescription) -> ClientResult<()> {
        self.state.connect_count.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(ClientError::transport("mock connect refused"));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> ClientResult<()> {
        self.state.disconnect_count.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    async fn read(&self, nodes: &[ReadValueId]) -> ClientResult<Vec<DataValue>> {
        self.state.read_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_service()?;

        let values = self.state.values.read();
        Ok(nodes
            .iter()
            .map(|node| match values.get(&node.node_id) {
                Some(value) => DataValue::good(value.clone()),
                None => DataValue::bad(StatusCode::BAD_NODE_ID_UNKNOWN),
            })
            .collect())
    }

    async fn write(&self, values: &[WriteValue]) -> ClientResult<Vec<StatusCode>> {
        self.state.write_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_service()?;

        let mut store = self.state.values.write();
        let mut history = self.state.write_history.lock();
        for write in values {
            store.insert(write.node_id.clone(), write.value.clone());
            history.push(write.clone());
        }
        Ok(vec![StatusCode::GOOD; values.len()])
    }

    async fn call(&self, requests: &[CallMethodRequest]) -> ClientResult<Vec<CallResponse>> {
        self.state.call_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_service()?;

        Ok(requests
            .iter()
            .map(|request| CallResponse {
                status: StatusCode::GOOD,
                output_arguments: request.input_arguments.clone(),
                input_argument_results: vec![StatusCode::GOOD; request.input_arguments.len()],
            })
            .collect())
    }

    async fn begin_read(
        &self,
        transaction_id: TransactionId,
        _nodes: &[ReadValueId],
    ) -> ClientResult<()> {
        self.state.begin_read_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_service()?;
        self.state.record_submission(transaction_id);
        Ok(())
    }

    async fn begin_write(
        &self,
        transaction_id: TransactionId,
        _values: &[WriteValue],
    ) -> ClientResult<()> {
        self.state.begin_write_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_service()?;
        self.state.record_submission(transaction_id);
        Ok(())
    }

    async fn begin_call(
        &self,
        transaction_id: TransactionId,
        _requests: &[CallMethodRequest],
    ) -> ClientResult<()> {
        self.state.begin_call_count.fetch_add(1, Ordering::SeqCst);
        self.state.check_service()?;
        self.state.record_submission(transaction_id);
        Ok(())
    }

    async fn create_subscription(
        &self,
        settings: &SubscriptionSettings,
    ) -> ClientResult<RevisedSubscription> {
        self.state
            .create_subscription_count
            .fetch_add(1, Ordering::SeqCst);
        self.state.check_service()?;

        Ok(RevisedSubscription {
            server_subscription_id: self.state.next_subscription_id.fetch_add(1, Ordering::SeqCst),
            revised_publishing_interval: settings.publishing_interval,
            revised_lifetime_count: settings.lifetime_count,
            revised_max_keepalive_count: settings.max_keepalive_count,
        })
    }

    async fn delete_subscription(&self, server_subscription_id: u32) -> ClientResult<()> {
        self.state.check_service()?;
        self.state
            .deleted_subscriptions
            .lock()
            .push(server_subscription_id);
        Ok(())
    }

    async fn create_monitored_items(
        &self,
        _server_subscription_id: u32,
        items: &[MonitoredItemRequest],
    ) -> ClientResult<Vec<MonitoredItemResult>> {
        self.state
            .create_monitored_items_count
            .fetch_add(1, Ordering::SeqCst);
        self.state.check_service()?;

        Ok(items
            .iter()
            .map(|item| MonitoredItemResult {
                status: StatusCode::GOOD,
                server_item_id: self.state.next_item_id.fetch_add(1, Ordering::SeqCst),
                revised_sampling_interval: item.sampling_interval,
                revised_queue_size: item.queue_size,
            })
            .collect())
    }
}

// =============================================================================
// Mock Transport Factory
// =============================================================================

/// Creates mock transports and keeps a handle to every one of them for
/// later inspection.
#[derive(Default)]
pub struct MockTransportFactory {
    /// Server URIs whose transports refuse to connect.
    fail_connect_uris: Mutex<HashSet<String>>,

    /// Node values seeded into transports at creation, per server URI.
    seeded_values: Mutex<HashMap<String, Vec<(NodeId, UaValue)>>>,

    /// Every transport created so far.
    created: Mutex<Vec<Arc<MockTransportState>>>,
}

impl MockTransportFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes transports to `server_uri` refuse to connect.
    pub fn fail_connections_to(&self, server_uri: impl Into<String>) {
        self.fail_connect_uris.lock().insert(server_uri.into());
    }

    /// Seeds a node value for transports to `server_uri`, including ones
    /// not created yet.
    pub fn seed_value(&self, server_uri: impl Into<String>, node_id: NodeId, value: UaValue) {
        let server_uri = server_uri.into();
        for transport in self.transports_for(&server_uri) {
            transport.set_value(node_id.clone(), value.clone());
        }
        self.seeded_values
            .lock()
            .entry(server_uri)
            .or_default()
            .push((node_id, value));
    }

    /// Returns every transport created so far.
    pub fn transports(&self) -> Vec<Arc<MockTransportState>> {
        self.created.lock().clone()
    }

    /// Returns every transport created for `server_uri`.
    pub fn transports_for(&self, server_uri: &str) -> Vec<Arc<MockTransportState>> {
        self.created
            .lock()
            .iter()
            .filter(|t| t.server_uri == server_uri)
            .cloned()
            .collect()
    }

    /// Returns the first transport created for `server_uri`.
    pub fn transport_for(&self, server_uri: &str) -> Option<Arc<MockTransportState>> {
        self.transports_for(server_uri).into_iter().next()
    }
}

impl TransportFactory for MockTransportFactory {
    fn create(
        &self,
        server_uri: &str,
        connection_id: ClientConnectionId,
        _settings: &SessionSettings,
        events: Weak<dyn SessionEventSink>,
    ) -> Box<dyn SessionTransport> {
        let state = Arc::new(MockTransportState::new(server_uri, connection_id, events));

        if self.fail_connect_uris.lock().contains(server_uri) {
            state.fail_connect(true);
        }
        if let Some(seeds) = self.seeded_values.lock().get(server_uri) {
            for (node_id, value) in seeds {
                state.set_value(node_id.clone(), value.clone());
            }
        }

        self.created.lock().push(Arc::clone(&state));
        Box::new(MockTransport { state })
    }
}

// =============================================================================
// Recording Client Interface
// =============================================================================

/// One delivery recorded by the [`RecordingClientInterface`].
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A connection status change.
    StatusChanged {
        /// The session whose status changed.
        connection_id: ClientConnectionId,
        /// The reported status.
        status: ServerStatus,
    },

    /// A completed asynchronous read.
    ReadComplete(ReadResult),

    /// A completed asynchronous write.
    WriteComplete(WriteResult),

    /// A completed asynchronous method call.
    CallComplete(MethodCallResult),
}

/// Client interface that records every delivery for verification.
#[derive(Default)]
pub struct RecordingClientInterface {
    events: Mutex<Vec<ClientEvent>>,
}

impl RecordingClientInterface {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events.
    pub fn events(&self) -> Vec<ClientEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns all recorded events.
    pub fn take_events(&self) -> Vec<ClientEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Returns all recorded call completions.
    pub fn call_completes(&self) -> Vec<MethodCallResult> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ClientEvent::CallComplete(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    /// Returns all recorded read completions.
    pub fn read_completes(&self) -> Vec<ReadResult> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ClientEvent::ReadComplete(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    /// Returns all recorded write completions.
    pub fn write_completes(&self) -> Vec<WriteResult> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ClientEvent::WriteComplete(result) => Some(result),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ClientInterface for RecordingClientInterface {
    async fn connection_status_changed(
        &self,
        information: SessionInformation,
        status: ServerStatus,
    ) {
        self.events.lock().push(ClientEvent::StatusChanged {
            connection_id: information.client_connection_id,
            status,
        });
    }

    async fn read_complete(&self, result: ReadResult) {
        self.events.lock().push(ClientEvent::ReadComplete(result));
    }

    async fn write_complete(&self, result: WriteResult) {
        self.events.lock().push(ClientEvent::WriteComplete(result));
    }

    async fn call_complete(&self, result: MethodCallResult) {
        self.events.lock().push(ClientEvent::CallComplete(result));
    }
}
