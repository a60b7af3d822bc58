// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Asynchronous completion sink implemented by the embedding application.
//!
//! Results of asynchronous services and connection state changes are pushed
//! through [`ClientInterface`]. The request handle the caller supplied on
//! the request is preserved on every delivered result, so the application
//! can correlate completions with its own bookkeeping.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::services::results::{MethodCallResult, ReadResult, WriteResult};
use crate::sessions::session::SessionInformation;

// =============================================================================
// ServerStatus
// =============================================================================

/// Connection status reported by the transport for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    /// The connection is down.
    #[default]
    Disconnected,

    /// The connection is established.
    Connected,

    /// The watchdog missed a keepalive; the connection is suspect.
    ConnectionWarningWatchdogTimeout,

    /// The transport lost the connection and requests a reconnect.
    ConnectionErrorApiReconnect,

    /// The server announced a shutdown.
    ServerShutdown,

    /// The connection was re-established with a new server-side session.
    NewSessionCreated,
}

impl ServerStatus {
    /// Returns `true` if the status represents a usable connection.
    #[inline]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::NewSessionCreated)
    }

    /// Returns `true` if the status asks the client to reconnect.
    #[inline]
    pub const fn wants_reconnect(&self) -> bool {
        matches!(self, Self::ConnectionErrorApiReconnect)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
            Self::ConnectionWarningWatchdogTimeout => {
                write!(f, "ConnectionWarningWatchdogTimeout")
            }
            Self::ConnectionErrorApiReconnect => write!(f, "ConnectionErrorApiReconnect"),
            Self::ServerShutdown => write!(f, "ServerShutdown"),
            Self::NewSessionCreated => write!(f, "NewSessionCreated"),
        }
    }
}

// =============================================================================
// ClientInterface
// =============================================================================

/// Typed completion sink for asynchronous deliveries.
///
/// All methods default to no-ops so applications only override the
/// deliveries they care about.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; deliveries are invoked from
/// transport tasks concurrently with ordinary client calls.
#[async_trait]
pub trait ClientInterface: Send + Sync {
    /// Called when the connection status of a session changes.
    async fn connection_status_changed(
        &self,
        _information: SessionInformation,
        _status: ServerStatus,
    ) {
    }

    /// Called when an asynchronous read completes.
    async fn read_complete(&self, _result: ReadResult) {}

    /// Called when an asynchronous write completes.
    async fn write_complete(&self, _result: WriteResult) {}

    /// Called when an asynchronous method call completes.
    async fn call_complete(&self, _result: MethodCallResult) {}
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_status() {
        assert!(ServerStatus::Connected.is_connected());
        assert!(ServerStatus::NewSessionCreated.is_connected());
        assert!(!ServerStatus::Disconnected.is_connected());
        assert!(ServerStatus::ConnectionErrorApiReconnect.wants_reconnect());
        assert!(!ServerStatus::Connected.wants_reconnect());
    }

    #[test]
    fn test_display() {
        assert_eq!(ServerStatus::ServerShutdown.to_string(), "ServerShutdown");
    }
}
