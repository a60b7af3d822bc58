// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server discovery registry.
//!
//! The discoverer maps logical server URIs to the endpoint descriptors a
//! session can connect to. Session acquisition treats an unknown server URI
//! as a hard failure, so every server a request may address must have been
//! registered here first (from configuration, or from a separate discovery
//! run against the configured discovery URLs).

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use arcus_core::error::{ClientError, ClientResult};
use arcus_core::settings::{SecurityMode, SecurityPolicy};

// =============================================================================
// EndpointDescription
// =============================================================================

/// One endpoint of a discovered server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescription {
    /// The endpoint URL (e.g. `opc.tcp://host:4840`).
    pub endpoint_url: String,

    /// Security policy offered by the endpoint.
    #[serde(default)]
    pub security_policy: SecurityPolicy,

    /// Message security mode offered by the endpoint.
    #[serde(default)]
    pub security_mode: SecurityMode,
}

impl EndpointDescription {
    /// Creates an endpoint description without security.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            security_policy: SecurityPolicy::None,
            security_mode: SecurityMode::None,
        }
    }

    /// Sets the security policy and mode.
    pub fn with_security(mut self, policy: SecurityPolicy, mode: SecurityMode) -> Self {
        self.security_policy = policy;
        self.security_mode = mode;
        self
    }
}

// =============================================================================
// Discoverer
// =============================================================================

/// Registry of discovered servers and their endpoints.
///
/// # Thread Safety
///
/// The discoverer is safe to share across tasks; registration and lookup
/// may run concurrently with session acquisition.
#[derive(Debug, Default)]
pub struct Discoverer {
    /// Endpoints keyed by server URI.
    servers: DashMap<String, Vec<EndpointDescription>>,
}

impl Discoverer {
    /// Creates an empty discoverer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the endpoints of a server.
    pub fn register_server(
        &self,
        server_uri: impl Into<String>,
        endpoints: Vec<EndpointDescription>,
    ) {
        let server_uri = server_uri.into();
        tracing::debug!(
            server_uri = %server_uri,
            endpoints = endpoints.len(),
            "Registered server"
        );
        self.servers.insert(server_uri, endpoints);
    }

    /// Removes a server from the registry.
    pub fn unregister_server(&self, server_uri: &str) -> bool {
        self.servers.remove(server_uri).is_some()
    }

    /// Returns the endpoints of a server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Discovery`] if the server URI was never
    /// registered, or was registered without endpoints.
    pub fn find_endpoints(&self, server_uri: &str) -> ClientResult<Vec<EndpointDescription>> {
        match self.servers.get(server_uri) {
            Some(endpoints) if !endpoints.is_empty() => Ok(endpoints.clone()),
            _ => Err(ClientError::discovery(server_uri)),
        }
    }

    /// Returns `true` if the server URI is known.
    pub fn contains(&self, server_uri: &str) -> bool {
        self.servers
            .get(server_uri)
            .map(|e| !e.is_empty())
            .unwrap_or(false)
    }

    /// Returns a snapshot of all registered server URIs.
    pub fn server_uris(&self) -> Vec<String> {
        self.servers.iter().map(|e| e.key().clone()).collect()
    }

    /// Returns the number of registered servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns `true` if no servers are registered.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_find() {
        let discoverer = Discoverer::new();
        discoverer.register_server(
            "urn:plant:press",
            vec![EndpointDescription::new("opc.tcp://press:4840")],
        );

        let endpoints = discoverer.find_endpoints("urn:plant:press").unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].endpoint_url, "opc.tcp://press:4840");
        assert!(discoverer.contains("urn:plant:press"));
    }

    #[test]
    fn test_unknown_server_is_a_hard_miss() {
        let discoverer = Discoverer::new();
        let error = discoverer.find_endpoints("urn:never:seen").unwrap_err();
        assert!(matches!(error, ClientError::Discovery { .. }));
    }

    #[test]
    fn test_empty_endpoint_list_is_a_miss() {
        let discoverer = Discoverer::new();
        discoverer.register_server("urn:plant:press", Vec::new());
        assert!(discoverer.find_endpoints("urn:plant:press").is_err());
        assert!(!discoverer.contains("urn:plant:press"));
    }

    #[test]
    fn test_unregister() {
        let discoverer = Discoverer::new();
        discoverer.register_server(
            "urn:plant:press",
            vec![EndpointDescription::new("opc.tcp://press:4840")],
        );
        assert!(discoverer.unregister_server("urn:plant:press"));
        assert!(!discoverer.unregister_server("urn:plant:press"));
        assert!(discoverer.is_empty());
    }
}
