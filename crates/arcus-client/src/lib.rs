// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! ARCUS OPC UA client framework.
//!
//! This crate turns typed, server-spanning service requests into
//! per-server sessions and invocations. Callers address nodes by logical
//! server URI; the framework resolves servers through discovery, creates
//! and reuses sessions, fans requests out across them, and correlates
//! asynchronous completions back to the caller.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       SessionFactory                       │
//! │  invoke<S>() ─ manual control ─ housekeeping ─ snapshots   │
//! └────────────────────────────────────────────────────────────┘
//!        │                  │                        ▲
//!        ▼                  ▼                        │ completions
//! ┌──────────────┐  ┌──────────────────┐  ┌────────────────────┐
//! │ Invocation   │  │   SessionTable   │  │ TransactionRegistry│
//! │ Factory<S>   │  │ (activity counts)│  │ (id → req handle)  │
//! └──────────────┘  └──────────────────┘  └────────────────────┘
//!                           │
//!                           ▼
//!                   ┌──────────────┐     ┌─────────────────────┐
//!                   │   Session    │ ──▶ │  SessionTransport   │
//!                   │ (+ subscr.)  │     │   (wire backend)    │
//!                   └──────────────┘     └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use arcus_client::prelude::*;
//!
//! let factory = SessionFactory::new(database, discoverer, interface, transports);
//!
//! let request = ReadRequest::new(vec![
//!     ReadRequestTarget::new(NodeAddress::new("urn:plant:press", NodeId::numeric(2, 1001))),
//! ]);
//! let result = factory.invoke::<ReadService>(&request, &Mask::all(1)).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod database;
pub mod discovery;
pub mod interface;
pub mod services;
pub mod sessions;
pub mod subscriptions;
pub mod transport;

pub use database::{ClientSettings, Database};
pub use discovery::{Discoverer, EndpointDescription};
pub use interface::{ClientInterface, ServerStatus};
pub use sessions::{
    Session, SessionFactory, SessionInformation, SessionLease, SessionState, SessionTable,
    TransactionRegistry,
};
pub use subscriptions::{
    CreatedMonitoredItem, SubscriptionFactory, SubscriptionInformation,
};
pub use transport::{SessionEventSink, SessionTransport, TransportFactory};

/// Convenience re-exports for embedding applications.
pub mod prelude {
    pub use arcus_core::{
        ClientConnectionId, ClientError, ClientResult, ClientSubscriptionHandle, Mask,
        NodeAddress, NodeId, RequestHandle, SessionSettings, StatusCode,
        SubscriptionSettings, TransactionId, UaValue,
    };

    pub use crate::database::{ClientSettings, Database};
    pub use crate::discovery::{Discoverer, EndpointDescription};
    pub use crate::interface::{ClientInterface, ServerStatus};
    pub use crate::services::requests::{
        CreateMonitoredDataRequest, CreateMonitoredDataTarget, MethodCallRequest,
        MethodCallRequestTarget, ReadRequest, ReadRequestTarget, WriteRequest,
        WriteRequestTarget,
    };
    pub use crate::services::results::{
        CreateMonitoredDataResult, MethodCallResult, ReadResult, WriteResult,
    };
    pub use crate::services::{
        AsyncMethodCallService, AsyncReadService, AsyncWriteService,
        CreateMonitoredDataService, MethodCallService, ReadService, WriteService,
    };
    pub use crate::sessions::SessionFactory;
}
