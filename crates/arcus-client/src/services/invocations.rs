// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-service invocations.
//!
//! An invocation is one server's share of a fanned-out request: the wire
//! operands for the targets that address that server, plus the original
//! target indices so per-target data lands back at the right positions in
//! the caller's result. Synchronous invocations hold their response until
//! `copy_to_result`; asynchronous invocations only submit, their data
//! path completes through the client interface.

use async_trait::async_trait;

use arcus_core::error::{ClientError, ClientResult};
use arcus_core::settings::{SessionSettings, SubscriptionSettings};
use arcus_core::status::StatusCode;
use arcus_core::types::{DataValue, TransactionId};

use crate::sessions::session::{Session, SessionInformation};
use crate::subscriptions::CreatedMonitoredItem;
use crate::transport::{CallMethodRequest, CallResponse, MonitoredItemRequest, ReadValueId, WriteValue};

use super::requests::{
    CreateMonitoredDataTarget, MethodCallRequestTarget, ReadRequestTarget, UaRequest,
    WriteRequestTarget,
};
use super::results::{
    CreateMonitoredDataResultTarget, MethodCallResultTarget, ReadResultTarget,
};
use super::Service;

// =============================================================================
// ServiceInvocation
// =============================================================================

/// One server's share of a request.
#[async_trait]
pub trait ServiceInvocation<S: Service>: Send {
    /// Creates an empty invocation for `server_uri`.
    fn new(server_uri: &str, session_settings: SessionSettings, request: &S::Request) -> Self
    where
        Self: Sized;

    /// Adds the request target at `index` to this invocation.
    fn add_target(&mut self, index: usize, target: &<S::Request as UaRequest>::Target);

    /// The server this invocation addresses.
    fn server_uri(&self) -> &str;

    /// The session settings the session must match.
    fn session_settings(&self) -> &SessionSettings;

    /// Stamps the transaction id of an asynchronous request.
    fn set_transaction_id(&mut self, transaction_id: TransactionId);

    /// Copies the acquired session's snapshot into the invocation, so it
    /// carries enough context to format its completion.
    fn set_session_information(&mut self, information: SessionInformation);

    /// The session snapshot, once one was copied in.
    fn session_information(&self) -> Option<&SessionInformation>;

    /// Executes (or submits) the invocation on the given session.
    async fn forward(&mut self, session: &Session) -> ClientResult<()>;

    /// Writes the per-target data back into the caller's result at the
    /// original indices. No-op for asynchronous services.
    fn copy_to_result(&self, _result: &mut S::Result) -> ClientResult<()> {
        Ok(())
    }
}

// =============================================================================
// Shared plumbing
// =============================================================================

/// State every invocation carries.
#[derive(Debug)]
struct InvocationCore {
    server_uri: String,
    session_settings: SessionSettings,
    session_information: Option<SessionInformation>,
    transaction_id: Option<TransactionId>,
    indices: Vec<usize>,
}

impl InvocationCore {
    fn new(server_uri: &str, session_settings: SessionSettings) -> Self {
        Self {
            server_uri: server_uri.to_string(),
            session_settings,
            session_information: None,
            transaction_id: None,
            indices: Vec::new(),
        }
    }

    fn transaction_id(&self) -> ClientResult<TransactionId> {
        self.transaction_id.ok_or_else(|| {
            ClientError::internal("asynchronous invocation forwarded without a transaction id")
        })
    }
}

macro_rules! core_accessors {
    () => {
        fn server_uri(&self) -> &str {
            &self.core.server_uri
        }

        fn session_settings(&self) -> &SessionSettings {
            &self.core.session_settings
        }

        fn set_transaction_id(&mut self, transaction_id: TransactionId) {
            self.core.transaction_id = Some(transaction_id);
        }

        fn set_session_information(&mut self, information: SessionInformation) {
            self.core.session_information = Some(information);
        }

        fn session_information(&self) -> Option<&SessionInformation> {
            self.core.session_information.as_ref()
        }
    };
}

fn read_operand(target: &ReadRequestTarget) -> ReadValueId {
    ReadValueId {
        node_id: target.address.node_id.clone(),
        attribute_id: target.attribute_id,
    }
}

fn write_operand(target: &WriteRequestTarget) -> WriteValue {
    WriteValue {
        node_id: target.address.node_id.clone(),
        attribute_id: target.attribute_id,
        value: target.value.clone(),
    }
}

fn call_operand(target: &MethodCallRequestTarget) -> CallMethodRequest {
    CallMethodRequest {
        object_id: target.object_address.node_id.clone(),
        method_id: target.method_address.node_id.clone(),
        input_arguments: target.input_arguments.clone(),
    }
}

// =============================================================================
// Read
// =============================================================================

/// Synchronous read of one server's targets.
#[derive(Debug)]
pub struct ReadInvocation {
    core: InvocationCore,
    nodes: Vec<ReadValueId>,
    values: Vec<DataValue>,
}

#[async_trait]
impl ServiceInvocation<super::ReadService> for ReadInvocation {
    fn new(server_uri: &str, session_settings: SessionSettings, _request: &super::requests::ReadRequest) -> Self {
        Self {
            core: InvocationCore::new(server_uri, session_settings),
            nodes: Vec::new(),
            values: Vec::new(),
        }
    }

    fn add_target(&mut self, index: usize, target: &ReadRequestTarget) {
        self.core.indices.push(index);
        self.nodes.push(read_operand(target));
    }

    core_accessors!();

    async fn forward(&mut self, session: &Session) -> ClientResult<()> {
        self.values = session.read(&self.nodes).await?;
        Ok(())
    }

    fn copy_to_result(&self, result: &mut super::results::ReadResult) -> ClientResult<()> {
        for (slot, &index) in self.core.indices.iter().enumerate() {
            let data = self
                .values
                .get(slot)
                .cloned()
                .unwrap_or_else(|| DataValue::bad(StatusCode::BAD_UNEXPECTED_ERROR));
            if let Some(target) = result.targets.get_mut(index) {
                *target = ReadResultTarget::from(data);
            }
        }
        Ok(())
    }
}

/// Asynchronous read submission for one server's targets.
#[derive(Debug)]
pub struct AsyncReadInvocation {
    core: InvocationCore,
    nodes: Vec<ReadValueId>,
}

#[async_trait]
impl ServiceInvocation<super::AsyncReadService> for AsyncReadInvocation {
    fn new(server_uri: &str, session_settings: SessionSettings, _request: &super::requests::ReadRequest) -> Self {
        Self {
            core: InvocationCore::new(server_uri, session_settings),
            nodes: Vec::new(),
        }
    }

    fn add_target(&mut self, index: usize, target: &ReadRequestTarget) {
        self.core.indices.push(index);
        self.nodes.push(read_operand(target));
    }

    core_accessors!();

    async fn forward(&mut self, session: &Session) -> ClientResult<()> {
        session
            .begin_read(self.core.transaction_id()?, &self.nodes)
            .await
    }
}

// =============================================================================
// Write
// =============================================================================

/// Synchronous write of one server's targets.
#[derive(Debug)]
pub struct WriteInvocation {
    core: InvocationCore,
    values: Vec<WriteValue>,
    statuses: Vec<StatusCode>,
}

#[async_trait]
impl ServiceInvocation<super::WriteService> for WriteInvocation {
    fn new(server_uri: &str, session_settings: SessionSettings, _request: &super::requests::WriteRequest) -> Self {
        Self {
            core: InvocationCore::new(server_uri, session_settings),
            values: Vec::new(),
            statuses: Vec::new(),
        }
    }

    fn add_target(&mut self, index: usize, target: &WriteRequestTarget) {
        self.core.indices.push(index);
        self.values.push(write_operand(target));
    }

    core_accessors!();

    async fn forward(&mut self, session: &Session) -> ClientResult<()> {
        self.statuses = session.write(&self.values).await?;
        Ok(())
    }

    fn copy_to_result(&self, result: &mut super::results::WriteResult) -> ClientResult<()> {
        for (slot, &index) in self.core.indices.iter().enumerate() {
            let status = self
                .statuses
                .get(slot)
                .copied()
                .unwrap_or(StatusCode::BAD_UNEXPECTED_ERROR);
            if let Some(target) = result.targets.get_mut(index) {
                target.status = status;
            }
        }
        Ok(())
    }
}

/// Asynchronous write submission for one server's targets.
#[derive(Debug)]
pub struct AsyncWriteInvocation {
    core: InvocationCore,
    values: Vec<WriteValue>,
}

#[async_trait]
impl ServiceInvocation<super::AsyncWriteService> for AsyncWriteInvocation {
    fn new(server_uri: &str, session_settings: SessionSettings, _request: &super::requests::WriteRequest) -> Self {
        Self {
            core: InvocationCore::new(server_uri, session_settings),
            values: Vec::new(),
        }
    }

    fn add_target(&mut self, index: usize, target: &WriteRequestTarget) {
        self.core.indices.push(index);
        self.values.push(write_operand(target));
    }

    core_accessors!();

    async fn forward(&mut self, session: &Session) -> ClientResult<()> {
        session
            .begin_write(self.core.transaction_id()?, &self.values)
            .await
    }
}

// =============================================================================
// Method call
// =============================================================================

/// Synchronous method calls on one server.
#[derive(Debug)]
pub struct MethodCallInvocation {
    core: InvocationCore,
    calls: Vec<CallMethodRequest>,
    responses: Vec<CallResponse>,
}

#[async_trait]
impl ServiceInvocation<super::MethodCallService> for MethodCallInvocation {
    fn new(
        server_uri: &str,
        session_settings: SessionSettings,
        _request: &super::requests::MethodCallRequest,
    ) -> Self {
        Self {
            core: InvocationCore::new(server_uri, session_settings),
            calls: Vec::new(),
            responses: Vec::new(),
        }
    }

    fn add_target(&mut self, index: usize, target: &MethodCallRequestTarget) {
        self.core.indices.push(index);
        self.calls.push(call_operand(target));
    }

    core_accessors!();

    async fn forward(&mut self, session: &Session) -> ClientResult<()> {
        self.responses = session.call(&self.calls).await?;
        Ok(())
    }

    fn copy_to_result(&self, result: &mut super::results::MethodCallResult) -> ClientResult<()> {
        for (slot, &index) in self.core.indices.iter().enumerate() {
            let target_result = self
                .responses
                .get(slot)
                .cloned()
                .map(MethodCallResultTarget::from)
                .unwrap_or_else(|| MethodCallResultTarget {
                    status: StatusCode::BAD_UNEXPECTED_ERROR,
                    ..MethodCallResultTarget::default()
                });
            if let Some(target) = result.targets.get_mut(index) {
                *target = target_result;
            }
        }
        Ok(())
    }
}

/// Asynchronous method-call submission on one server.
#[derive(Debug)]
pub struct AsyncMethodCallInvocation {
    core: InvocationCore,
    calls: Vec<CallMethodRequest>,
}

#[async_trait]
impl ServiceInvocation<super::AsyncMethodCallService> for AsyncMethodCallInvocation {
    fn new(
        server_uri: &str,
        session_settings: SessionSettings,
        _request: &super::requests::MethodCallRequest,
    ) -> Self {
        Self {
            core: InvocationCore::new(server_uri, session_settings),
            calls: Vec::new(),
        }
    }

    fn add_target(&mut self, index: usize, target: &MethodCallRequestTarget) {
        self.core.indices.push(index);
        self.calls.push(call_operand(target));
    }

    core_accessors!();

    async fn forward(&mut self, session: &Session) -> ClientResult<()> {
        session
            .begin_call(self.core.transaction_id()?, &self.calls)
            .await
    }
}

// =============================================================================
// Create monitored data
// =============================================================================

/// Creation of monitored data items on one server.
///
/// Dispatched like any other invocation, but the work happens one level
/// down: the session's subscription factory finds or creates the matching
/// subscription before the items are created on it.
#[derive(Debug)]
pub struct CreateMonitoredDataInvocation {
    core: InvocationCore,
    subscription_settings: SubscriptionSettings,
    items: Vec<MonitoredItemRequest>,
    outcomes: Vec<CreatedMonitoredItem>,
}

#[async_trait]
impl ServiceInvocation<super::CreateMonitoredDataService> for CreateMonitoredDataInvocation {
    fn new(
        server_uri: &str,
        session_settings: SessionSettings,
        request: &super::requests::CreateMonitoredDataRequest,
    ) -> Self {
        Self {
            core: InvocationCore::new(server_uri, session_settings),
            subscription_settings: request
                .subscription_settings
                .clone()
                .unwrap_or_default(),
            items: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    fn add_target(&mut self, index: usize, target: &CreateMonitoredDataTarget) {
        self.core.indices.push(index);
        self.items.push(MonitoredItemRequest {
            node_id: target.address.node_id.clone(),
            attribute_id: target.attribute_id,
            client_handle: index as u32,
            sampling_interval: target.sampling_interval,
            queue_size: target.queue_size,
            discard_oldest: target.discard_oldest,
        });
    }

    core_accessors!();

    async fn forward(&mut self, session: &Session) -> ClientResult<()> {
        self.outcomes = session
            .create_monitored_data(&self.subscription_settings, &self.items)
            .await?;
        Ok(())
    }

    fn copy_to_result(
        &self,
        result: &mut super::results::CreateMonitoredDataResult,
    ) -> ClientResult<()> {
        for (slot, &index) in self.core.indices.iter().enumerate() {
            let target_result = match self.outcomes.get(slot) {
                Some(outcome) => CreateMonitoredDataResultTarget {
                    status: outcome.status,
                    monitored_item_id: outcome.monitored_item_id,
                    revised_sampling_interval: outcome.revised_sampling_interval,
                    revised_queue_size: outcome.revised_queue_size,
                },
                None => CreateMonitoredDataResultTarget {
                    status: StatusCode::BAD_UNEXPECTED_ERROR,
                    ..CreateMonitoredDataResultTarget::default()
                },
            };
            if let Some(target) = result.targets.get_mut(index) {
                *target = target_result;
            }
        }
        Ok(())
    }
}
