// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for the ARCUS client framework.
//!
//! Every user-facing operation returns a single [`ClientError`] on failure.
//! Partial per-target failures (one of ten reads rejected by the server)
//! are not errors at this level; they surface as bad status codes on the
//! individual result targets.
//!
//! # Examples
//!
//! ```
//! use arcus_core::error::ClientError;
//!
//! let error = ClientError::discovery("urn:unknown:server");
//! assert!(!error.is_retryable());
//!
//! let error = ClientError::transport("socket closed");
//! assert!(error.is_retryable());
//! ```

use thiserror::Error;

use crate::status::StatusCode;
use crate::types::{ClientConnectionId, ClientSubscriptionHandle, TransactionId};

/// Convenience alias for results carrying a [`ClientError`].
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// ClientError
// =============================================================================

/// The root error type of the client framework.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server URI was never observed by the discovery process.
    #[error("Server URI '{server_uri}' was not found by the discovery process")]
    Discovery {
        /// The URI that failed to resolve.
        server_uri: String,
    },

    /// A session was acquired but is not connected, so the service could
    /// not be invoked on it.
    #[error("No connected session to invoke the service ({connection_id} to '{server_uri}')")]
    NotConnected {
        /// Id of the disconnected session.
        connection_id: ClientConnectionId,
        /// Server URI of the disconnected session.
        server_uri: String,
    },

    /// The request cannot be served by this framework.
    #[error("Unsupported request: {message}")]
    Unsupported {
        /// Why the request is unsupported.
        message: String,
    },

    /// A session was released more often than it was acquired. This is a
    /// programming error in the caller (or in the factory itself).
    #[error("Session {connection_id} was released while its activity count was already zero")]
    ReleaseUnderflow {
        /// Id of the over-released session.
        connection_id: ClientConnectionId,
    },

    /// A manual operation referenced a connection id with no live session.
    #[error("Unknown client connection id {connection_id}")]
    UnknownConnectionId {
        /// The unknown id.
        connection_id: ClientConnectionId,
    },

    /// A subscription operation referenced an unknown subscription handle.
    #[error("Unknown client subscription handle {handle}")]
    UnknownSubscriptionHandle {
        /// The unknown handle.
        handle: ClientSubscriptionHandle,
    },

    /// A transaction id was bound twice without being erased in between.
    #[error("Transaction id {transaction_id} is already bound")]
    TransactionInUse {
        /// The already-bound id.
        transaction_id: TransactionId,
    },

    /// The transport failed to carry out an operation.
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// Status reported by the transport, when one is available.
        status: Option<StatusCode>,
    },

    /// The configuration is invalid.
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// An internal invariant was violated.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },
}

impl ClientError {
    /// Creates a discovery-miss error.
    pub fn discovery(server_uri: impl Into<String>) -> Self {
        Self::Discovery {
            server_uri: server_uri.into(),
        }
    }

    /// Creates a not-connected error.
    pub fn not_connected(
        connection_id: ClientConnectionId,
        server_uri: impl Into<String>,
    ) -> Self {
        Self::NotConnected {
            connection_id,
            server_uri: server_uri.into(),
        }
    }

    /// Creates an unsupported-request error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Creates a release-underflow error.
    pub fn release_underflow(connection_id: ClientConnectionId) -> Self {
        Self::ReleaseUnderflow { connection_id }
    }

    /// Creates an unknown-connection-id error.
    pub fn unknown_connection_id(connection_id: ClientConnectionId) -> Self {
        Self::UnknownConnectionId { connection_id }
    }

    /// Creates an unknown-subscription-handle error.
    pub fn unknown_subscription_handle(handle: ClientSubscriptionHandle) -> Self {
        Self::UnknownSubscriptionHandle { handle }
    }

    /// Creates a transport error without a status code.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a transport error carrying a status code.
    pub fn transport_status(message: impl Into<String>, status: StatusCode) -> Self {
        Self::Transport {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the failed operation may succeed when retried.
    ///
    /// Connection-state and transport failures are transient; everything
    /// else reflects a request or programming problem that a retry will
    /// not fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::NotConnected { .. } | ClientError::Transport { .. }
        )
    }

    /// Returns the error type as a short string for logging and metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ClientError::Discovery { .. } => "discovery",
            ClientError::NotConnected { .. } => "not_connected",
            ClientError::Unsupported { .. } => "unsupported",
            ClientError::ReleaseUnderflow { .. } => "release_underflow",
            ClientError::UnknownConnectionId { .. } => "unknown_connection_id",
            ClientError::UnknownSubscriptionHandle { .. } => "unknown_subscription_handle",
            ClientError::TransactionInUse { .. } => "transaction_in_use",
            ClientError::Transport { .. } => "transport",
            ClientError::Configuration { .. } => "configuration",
            ClientError::Internal { .. } => "internal",
        }
    }

    /// Maps the error to the OPC UA status code reported on result targets.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClientError::Discovery { .. } => StatusCode::BAD_SERVER_NOT_CONNECTED,
            ClientError::NotConnected { .. } => StatusCode::BAD_SERVER_NOT_CONNECTED,
            ClientError::Unsupported { .. } => StatusCode::BAD_SERVICE_UNSUPPORTED,
            ClientError::Transport { status, .. } => {
                status.unwrap_or(StatusCode::BAD_CONNECTION_CLOSED)
            }
            ClientError::UnknownSubscriptionHandle { .. } => {
                StatusCode::BAD_SUBSCRIPTION_ID_INVALID
            }
            _ => StatusCode::BAD_UNEXPECTED_ERROR,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(ClientError::transport("io").is_retryable());
        assert!(
            ClientError::not_connected(ClientConnectionId::new(1), "urn:s").is_retryable()
        );
        assert!(!ClientError::discovery("urn:s").is_retryable());
        assert!(!ClientError::release_underflow(ClientConnectionId::new(1)).is_retryable());
        assert!(!ClientError::unsupported("fan-out").is_retryable());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ClientError::discovery("urn:s").status_code(),
            StatusCode::BAD_SERVER_NOT_CONNECTED
        );
        assert_eq!(
            ClientError::unsupported("x").status_code(),
            StatusCode::BAD_SERVICE_UNSUPPORTED
        );
        assert_eq!(
            ClientError::transport_status("x", StatusCode::BAD_TIMEOUT).status_code(),
            StatusCode::BAD_TIMEOUT
        );
    }

    #[test]
    fn test_messages() {
        let error = ClientError::discovery("urn:plant:press");
        assert!(error.to_string().contains("urn:plant:press"));

        let error = ClientError::unknown_connection_id(ClientConnectionId::new(9));
        assert!(error.to_string().contains("conn-9"));
    }
}
