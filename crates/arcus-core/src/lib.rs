// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core types for the ARCUS OPC UA client framework.
//!
//! This crate holds the protocol-independent foundation shared by the
//! client framework: status codes, node identifiers and values, session
//! and subscription settings, and the unified error hierarchy.
//!
//! # Error Handling
//!
//! ```text
//! ClientError
//! ├── Discovery                 - Server URI unknown to discovery
//! ├── NotConnected              - Session acquired but not connected
//! ├── Unsupported               - Request shape the framework refuses
//! ├── ReleaseUnderflow          - Session released below zero activity
//! ├── UnknownConnectionId       - Manual operation on a missing session
//! ├── UnknownSubscriptionHandle - Operation on a missing subscription
//! ├── TransactionInUse          - Transaction id bound twice
//! ├── Transport                 - Wire-level failure
//! ├── Configuration             - Invalid settings
//! └── Internal                  - Violated invariant
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod settings;
pub mod status;
pub mod types;

pub use error::{ClientError, ClientResult};
pub use settings::{
    SecurityMode, SecurityPolicy, SessionSettings, SubscriptionSettings, UserTokenType,
};
pub use status::StatusCode;
pub use types::{
    AttributeId, ClientConnectionId, ClientSubscriptionHandle, DataValue, Mask,
    MonitoredItemId, NodeAddress, NodeId, NodeIdentifier, RequestHandle, TransactionId,
    UaValue,
};
