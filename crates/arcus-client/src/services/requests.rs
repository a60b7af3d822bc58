// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed requests and their targets.
//!
//! Requests come in two kinds. *Session requests* are dispatched directly
//! on sessions; when their service is asynchronous, the session factory
//! binds a transaction id for them. *Subscription requests* travel through
//! the same dispatch entry point but their asynchronous correlation is
//! handled one level down, so the factory never binds transactions for
//! them. The kind is part of the request type and cannot be forged from
//! outside this crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use arcus_core::settings::{SessionSettings, SubscriptionSettings};
use arcus_core::types::{AttributeId, NodeAddress, RequestHandle, UaValue};

// =============================================================================
// Request kinds
// =============================================================================

/// The dispatch kind of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Handled at the session level; asynchronous services bind a
    /// transaction id in the session factory.
    Session,

    /// Passed through to the subscription level; no transaction binding
    /// in the session factory.
    Subscription,
}

mod sealed {
    pub trait Sealed {}

    impl<T> Sealed for super::SessionRequest<T> {}
    impl<T> Sealed for super::SubscriptionRequest<T> {}
}

/// One target of a request, addressable by server URI.
pub trait RequestTarget: Clone + Send + Sync {
    /// The server this target lives on.
    fn server_uri(&self) -> &str;
}

/// Common surface of both request kinds.
///
/// This trait is sealed: the dispatcher's transaction-binding decision
/// rests on `kind()`, and only the two request shapes defined here may
/// answer it.
pub trait UaRequest: sealed::Sealed + Send + Sync {
    /// The target type carried by this request.
    type Target: RequestTarget;

    /// The dispatch kind.
    fn kind(&self) -> RequestKind;

    /// The ordered targets of the request.
    fn targets(&self) -> &[Self::Target];

    /// The caller-supplied request handle, preserved end-to-end.
    fn request_handle(&self) -> RequestHandle;

    /// Session settings carried by the request, if any.
    fn session_settings(&self) -> Option<&SessionSettings>;

    /// Subscription settings carried by the request, if any.
    fn subscription_settings(&self) -> Option<&SubscriptionSettings> {
        None
    }
}

// =============================================================================
// SessionRequest
// =============================================================================

/// A request dispatched at the session level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest<T> {
    /// The ordered targets.
    pub targets: Vec<T>,

    /// Caller-supplied handle identifying this logical request.
    pub request_handle: RequestHandle,

    /// Session settings; the client defaults apply when absent.
    pub session_settings: Option<SessionSettings>,
}

impl<T> SessionRequest<T> {
    /// Creates a request from targets.
    pub fn new(targets: Vec<T>) -> Self {
        Self {
            targets,
            request_handle: RequestHandle::default(),
            session_settings: None,
        }
    }

    /// Sets the request handle.
    pub fn with_request_handle(mut self, handle: RequestHandle) -> Self {
        self.request_handle = handle;
        self
    }

    /// Sets the session settings.
    pub fn with_session_settings(mut self, settings: SessionSettings) -> Self {
        self.session_settings = Some(settings);
        self
    }
}

impl<T: RequestTarget> UaRequest for SessionRequest<T> {
    type Target = T;

    fn kind(&self) -> RequestKind {
        RequestKind::Session
    }

    fn targets(&self) -> &[T] {
        &self.targets
    }

    fn request_handle(&self) -> RequestHandle {
        self.request_handle
    }

    fn session_settings(&self) -> Option<&SessionSettings> {
        self.session_settings.as_ref()
    }
}

// =============================================================================
// SubscriptionRequest
// =============================================================================

/// A request passed through to the subscription level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest<T> {
    /// The ordered targets.
    pub targets: Vec<T>,

    /// Caller-supplied handle identifying this logical request.
    pub request_handle: RequestHandle,

    /// Session settings; the client defaults apply when absent.
    pub session_settings: Option<SessionSettings>,

    /// Subscription settings selecting (or creating) the subscription the
    /// targets land on; defaults apply when absent.
    pub subscription_settings: Option<SubscriptionSettings>,
}

impl<T> SubscriptionRequest<T> {
    /// Creates a request from targets.
    pub fn new(targets: Vec<T>) -> Self {
        Self {
            targets,
            request_handle: RequestHandle::default(),
            session_settings: None,
            subscription_settings: None,
        }
    }

    /// Sets the request handle.
    pub fn with_request_handle(mut self, handle: RequestHandle) -> Self {
        self.request_handle = handle;
        self
    }

    /// Sets the session settings.
    pub fn with_session_settings(mut self, settings: SessionSettings) -> Self {
        self.session_settings = Some(settings);
        self
    }

    /// Sets the subscription settings.
    pub fn with_subscription_settings(mut self, settings: SubscriptionSettings) -> Self {
        self.subscription_settings = Some(settings);
        self
    }
}

impl<T: RequestTarget> UaRequest for SubscriptionRequest<T> {
    type Target = T;

    fn kind(&self) -> RequestKind {
        RequestKind::Subscription
    }

    fn targets(&self) -> &[T] {
        &self.targets
    }

    fn request_handle(&self) -> RequestHandle {
        self.request_handle
    }

    fn session_settings(&self) -> Option<&SessionSettings> {
        self.session_settings.as_ref()
    }

    fn subscription_settings(&self) -> Option<&SubscriptionSettings> {
        self.subscription_settings.as_ref()
    }
}

// =============================================================================
// Targets
// =============================================================================

/// One node/attribute to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadRequestTarget {
    /// The node to read.
    pub address: NodeAddress,

    /// The attribute to read.
    pub attribute_id: AttributeId,
}

impl ReadRequestTarget {
    /// Creates a target reading the value attribute.
    pub fn new(address: NodeAddress) -> Self {
        Self {
            address,
            attribute_id: AttributeId::Value,
        }
    }
}

impl RequestTarget for ReadRequestTarget {
    fn server_uri(&self) -> &str {
        &self.address.server_uri
    }
}

/// One node/attribute to write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequestTarget {
    /// The node to write.
    pub address: NodeAddress,

    /// The attribute to write.
    pub attribute_id: AttributeId,

    /// The value to write.
    pub value: UaValue,
}

impl WriteRequestTarget {
    /// Creates a target writing the value attribute.
    pub fn new(address: NodeAddress, value: UaValue) -> Self {
        Self {
            address,
            attribute_id: AttributeId::Value,
            value,
        }
    }
}

impl RequestTarget for WriteRequestTarget {
    fn server_uri(&self) -> &str {
        &self.address.server_uri
    }
}

/// One method to call on one object.
///
/// The object and the method must live on the same server; the object's
/// server URI decides which session the target is grouped onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCallRequestTarget {
    /// The object hosting the method.
    pub object_address: NodeAddress,

    /// The method to call.
    pub method_address: NodeAddress,

    /// Input arguments.
    pub input_arguments: Vec<UaValue>,
}

impl MethodCallRequestTarget {
    /// Creates a target without input arguments.
    pub fn new(object_address: NodeAddress, method_address: NodeAddress) -> Self {
        Self {
            object_address,
            method_address,
            input_arguments: Vec::new(),
        }
    }

    /// Sets the input arguments.
    pub fn with_input_arguments(mut self, arguments: Vec<UaValue>) -> Self {
        self.input_arguments = arguments;
        self
    }
}

impl RequestTarget for MethodCallRequestTarget {
    fn server_uri(&self) -> &str {
        &self.object_address.server_uri
    }
}

/// One node to start monitoring for data changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMonitoredDataTarget {
    /// The node to monitor.
    pub address: NodeAddress,

    /// The attribute to monitor.
    pub attribute_id: AttributeId,

    /// Requested sampling interval.
    pub sampling_interval: Duration,

    /// Requested queue size.
    pub queue_size: u32,

    /// Whether to discard the oldest value on queue overflow.
    pub discard_oldest: bool,
}

impl CreateMonitoredDataTarget {
    /// Creates a target with common monitoring defaults.
    pub fn new(address: NodeAddress) -> Self {
        Self {
            address,
            attribute_id: AttributeId::Value,
            sampling_interval: Duration::from_millis(500),
            queue_size: 1,
            discard_oldest: true,
        }
    }

    /// Sets the sampling interval.
    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.sampling_interval = interval;
        self
    }
}

impl RequestTarget for CreateMonitoredDataTarget {
    fn server_uri(&self) -> &str {
        &self.address.server_uri
    }
}

// =============================================================================
// Aliases
// =============================================================================

/// Request to read node attributes.
pub type ReadRequest = SessionRequest<ReadRequestTarget>;

/// Request to write node attributes.
pub type WriteRequest = SessionRequest<WriteRequestTarget>;

/// Request to call methods.
pub type MethodCallRequest = SessionRequest<MethodCallRequestTarget>;

/// Request to create monitored data items.
pub type CreateMonitoredDataRequest = SubscriptionRequest<CreateMonitoredDataTarget>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arcus_core::types::NodeId;

    fn address(uri: &str) -> NodeAddress {
        NodeAddress::new(uri, NodeId::numeric(2, 1001))
    }

    #[test]
    fn test_request_kinds() {
        let read = ReadRequest::new(vec![ReadRequestTarget::new(address("urn:a"))]);
        assert_eq!(read.kind(), RequestKind::Session);

        let monitored = CreateMonitoredDataRequest::new(vec![CreateMonitoredDataTarget::new(
            address("urn:a"),
        )]);
        assert_eq!(monitored.kind(), RequestKind::Subscription);
    }

    #[test]
    fn test_request_handle_preserved() {
        let request = ReadRequest::new(Vec::new()).with_request_handle(RequestHandle::new(42));
        assert_eq!(request.request_handle(), RequestHandle::new(42));
    }

    #[test]
    fn test_target_server_uri() {
        let target = WriteRequestTarget::new(address("urn:press"), UaValue::Int32(1));
        assert_eq!(target.server_uri(), "urn:press");

        let call = MethodCallRequestTarget::new(address("urn:press"), address("urn:press"));
        assert_eq!(call.server_uri(), "urn:press");
    }

    #[test]
    fn test_session_settings_default_to_none() {
        let request = ReadRequest::new(Vec::new());
        assert!(request.session_settings().is_none());

        let request = request.with_session_settings(SessionSettings::default());
        assert!(request.session_settings().is_some());
    }
}
