// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The service model: typed requests, results and invocations.
//!
//! A *service* ties one request type to one result type and one
//! invocation type, and declares whether its data path completes
//! synchronously or through the client interface. The session factory is
//! generic over services; adding a service means adding a tag type here
//! and an invocation in [`invocations`], nothing in the factory changes.
//!
//! The *invocation factory* splits one request into per-server
//! invocations: targets are grouped by the server URI they address, and
//! every group becomes one invocation carrying the original target
//! indices, so per-target data can be reassembled at the right positions.

pub mod invocations;
pub mod requests;
pub mod results;

use std::collections::BTreeMap;

use arcus_core::error::ClientResult;
use arcus_core::settings::SessionSettings;
use arcus_core::types::Mask;

use self::invocations::{
    AsyncMethodCallInvocation, AsyncReadInvocation, AsyncWriteInvocation,
    CreateMonitoredDataInvocation, MethodCallInvocation, ReadInvocation, ServiceInvocation,
    WriteInvocation,
};
use self::requests::{
    CreateMonitoredDataRequest, MethodCallRequest, ReadRequest, RequestTarget, UaRequest,
    WriteRequest,
};
use self::results::{
    CreateMonitoredDataResult, MethodCallResult, ReadResult, ServiceResult, WriteResult,
};

// =============================================================================
// Service
// =============================================================================

/// One service: a statically-typed request/result pair plus the invocation
/// that carries one server's share of the request.
pub trait Service: Sized + Send + Sync + 'static {
    /// Human-readable service name, used in logs.
    const NAME: &'static str;

    /// Whether the data path completes asynchronously through the client
    /// interface.
    const ASYNCHRONOUS: bool;

    /// The request type.
    type Request: UaRequest;

    /// The result type.
    type Result: ServiceResult;

    /// The invocation type.
    type Invocation: ServiceInvocation<Self>;
}

// =============================================================================
// Service tags
// =============================================================================

/// Synchronous attribute read.
pub struct ReadService;

impl Service for ReadService {
    const NAME: &'static str = "Read";
    const ASYNCHRONOUS: bool = false;
    type Request = ReadRequest;
    type Result = ReadResult;
    type Invocation = ReadInvocation;
}

/// Asynchronous attribute read; values arrive via the client interface.
pub struct AsyncReadService;

impl Service for AsyncReadService {
    const NAME: &'static str = "AsyncRead";
    const ASYNCHRONOUS: bool = true;
    type Request = ReadRequest;
    type Result = ReadResult;
    type Invocation = AsyncReadInvocation;
}

/// Synchronous attribute write.
pub struct WriteService;

impl Service for WriteService {
    const NAME: &'static str = "Write";
    const ASYNCHRONOUS: bool = false;
    type Request = WriteRequest;
    type Result = WriteResult;
    type Invocation = WriteInvocation;
}

/// Asynchronous attribute write.
pub struct AsyncWriteService;

impl Service for AsyncWriteService {
    const NAME: &'static str = "AsyncWrite";
    const ASYNCHRONOUS: bool = true;
    type Request = WriteRequest;
    type Result = WriteResult;
    type Invocation = AsyncWriteInvocation;
}

/// Synchronous method call.
pub struct MethodCallService;

impl Service for MethodCallService {
    const NAME: &'static str = "MethodCall";
    const ASYNCHRONOUS: bool = false;
    type Request = MethodCallRequest;
    type Result = MethodCallResult;
    type Invocation = MethodCallInvocation;
}

/// Asynchronous method call.
pub struct AsyncMethodCallService;

impl Service for AsyncMethodCallService {
    const NAME: &'static str = "AsyncMethodCall";
    const ASYNCHRONOUS: bool = true;
    type Request = MethodCallRequest;
    type Result = MethodCallResult;
    type Invocation = AsyncMethodCallInvocation;
}

/// Creation of monitored data items, dispatched through the session level
/// but handled by the subscription level.
pub struct CreateMonitoredDataService;

impl Service for CreateMonitoredDataService {
    const NAME: &'static str = "CreateMonitoredData";
    const ASYNCHRONOUS: bool = false;
    type Request = CreateMonitoredDataRequest;
    type Result = CreateMonitoredDataResult;
    type Invocation = CreateMonitoredDataInvocation;
}

// =============================================================================
// InvocationFactory
// =============================================================================

/// Groups the masked targets of one request into per-server invocations.
pub struct InvocationFactory<S: Service> {
    /// Invocations keyed by server URI.
    pub invocations: BTreeMap<String, S::Invocation>,
}

impl<S: Service> InvocationFactory<S> {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self {
            invocations: BTreeMap::new(),
        }
    }

    /// Builds the invocations for `request`.
    ///
    /// Targets excluded by `mask` are skipped and their result entries
    /// stay untouched. For asynchronous services every included target is
    /// marked submitted on `result`; the real data arrives later through
    /// the client interface.
    pub fn create(
        &mut self,
        request: &S::Request,
        settings: &SessionSettings,
        result: &mut S::Result,
        mask: &Mask,
    ) -> ClientResult<()> {
        for (index, target) in request.targets().iter().enumerate() {
            if !mask.is_set(index) {
                continue;
            }

            let invocation = self
                .invocations
                .entry(target.server_uri().to_string())
                .or_insert_with(|| {
                    S::Invocation::new(target.server_uri(), settings.clone(), request)
                });
            invocation.add_target(index, target);

            if S::ASYNCHRONOUS {
                result.mark_submitted(index);
            }
        }
        Ok(())
    }
}

impl<S: Service> Default for InvocationFactory<S> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arcus_core::status::StatusCode;
    use arcus_core::types::{NodeAddress, NodeId, RequestHandle};

    use super::requests::ReadRequestTarget;

    fn target(uri: &str, node: u32) -> ReadRequestTarget {
        ReadRequestTarget::new(NodeAddress::new(uri, NodeId::numeric(2, node)))
    }

    #[test]
    fn test_grouping_by_server_uri() {
        let request = ReadRequest::new(vec![
            target("urn:a", 1),
            target("urn:a", 2),
            target("urn:b", 3),
            target("urn:c", 4),
        ]);
        let mut result = ReadResult::default();
        result.prepare(RequestHandle::new(1), 4);

        let mut factory = InvocationFactory::<ReadService>::new();
        factory
            .create(&request, &SessionSettings::default(), &mut result, &Mask::all(4))
            .unwrap();

        assert_eq!(factory.invocations.len(), 3);
        let uris: Vec<&String> = factory.invocations.keys().collect();
        assert_eq!(uris, ["urn:a", "urn:b", "urn:c"]);
    }

    #[test]
    fn test_mask_excludes_targets() {
        let request = ReadRequest::new(vec![target("urn:a", 1), target("urn:b", 2)]);
        let mut result = ReadResult::default();
        result.prepare(RequestHandle::new(1), 2);

        let mut mask = Mask::new(2);
        mask.set(0);

        let mut factory = InvocationFactory::<ReadService>::new();
        factory
            .create(&request, &SessionSettings::default(), &mut result, &mask)
            .unwrap();

        assert_eq!(factory.invocations.len(), 1);
        assert!(factory.invocations.contains_key("urn:a"));
    }

    #[test]
    fn test_async_targets_marked_submitted() {
        let request = ReadRequest::new(vec![target("urn:a", 1), target("urn:a", 2)]);
        let mut result = ReadResult::default();
        result.prepare(RequestHandle::new(1), 2);

        let mut factory = InvocationFactory::<AsyncReadService>::new();
        factory
            .create(&request, &SessionSettings::default(), &mut result, &Mask::all(2))
            .unwrap();

        assert_eq!(factory.invocations.len(), 1);
        assert!(result
            .targets
            .iter()
            .all(|t| t.status == StatusCode::GOOD_COMPLETES_ASYNCHRONOUSLY));
    }
}
