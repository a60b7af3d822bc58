// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! Wires a session factory to mock collaborators for integration tests.
//!
//! ## Design Principles
//!
//! - One call sets up discovery, configuration, transports and the
//!   recording interface
//! - Parallel test isolation: every harness is fully independent
//! - Request builders for the common target shapes

use std::sync::Arc;

use arcus_core::settings::SessionSettings;
use arcus_core::types::{NodeAddress, NodeId, UaValue};

use arcus_client::database::{ClientSettings, Database};
use arcus_client::discovery::{Discoverer, EndpointDescription};
use arcus_client::interface::ClientInterface;
use arcus_client::services::requests::{
    MethodCallRequestTarget, ReadRequestTarget, WriteRequestTarget,
};
use arcus_client::sessions::SessionFactory;
use arcus_client::transport::TransportFactory;

use super::mocks::{MockTransportFactory, RecordingClientInterface};

// =============================================================================
// Test Client
// =============================================================================

/// A session factory wired to mocks, plus handles to all of them.
pub struct TestClient {
    /// The factory under test.
    pub factory: Arc<SessionFactory>,

    /// Discovery registry, pre-seeded with the harness servers.
    pub discoverer: Arc<Discoverer>,

    /// Configuration store.
    pub database: Arc<Database>,

    /// Mock transport factory, for failure injection and inspection.
    pub transports: Arc<MockTransportFactory>,

    /// Recording completion sink.
    pub interface: Arc<RecordingClientInterface>,
}

impl TestClient {
    /// Creates a harness with no servers registered.
    pub fn new() -> Self {
        Self::with_servers(&[])
    }

    /// Creates a harness with the given server URIs registered in
    /// discovery, each with one insecure endpoint.
    pub fn with_servers(server_uris: &[&str]) -> Self {
        let discoverer = Arc::new(Discoverer::new());
        for uri in server_uris {
            discoverer.register_server(
                *uri,
                vec![EndpointDescription::new(format!("opc.tcp://{}", uri))],
            );
        }

        let database = Arc::new(Database::new(ClientSettings::default()));
        let transports = Arc::new(MockTransportFactory::new());
        let interface = Arc::new(RecordingClientInterface::new());

        let factory = SessionFactory::new(
            Arc::clone(&database),
            Arc::clone(&discoverer),
            Arc::clone(&interface) as Arc<dyn ClientInterface>,
            Arc::clone(&transports) as Arc<dyn TransportFactory>,
        );

        Self {
            factory,
            discoverer,
            database,
            transports,
            interface,
        }
    }

    /// Enables tracing output for this test process. Safe to call from
    /// several tests; only the first initialisation wins.
    pub fn with_tracing(self) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        self
    }

    /// Returns the default session settings of the harness database.
    pub fn default_settings(&self) -> SessionSettings {
        self.database.default_session_settings()
    }

    /// Seeds a readable value on the given server.
    pub fn seed_value(&self, server_uri: &str, node: u32, value: UaValue) {
        self.transports
            .seed_value(server_uri, NodeId::numeric(2, node), value);
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Target builders
// =============================================================================

/// Builds a node address on `server_uri` with a numeric node id.
pub fn address(server_uri: &str, node: u32) -> NodeAddress {
    NodeAddress::new(server_uri, NodeId::numeric(2, node))
}

/// Builds a read target.
pub fn read_target(server_uri: &str, node: u32) -> ReadRequestTarget {
    ReadRequestTarget::new(address(server_uri, node))
}

/// Builds a write target.
pub fn write_target(server_uri: &str, node: u32, value: UaValue) -> WriteRequestTarget {
    WriteRequestTarget::new(address(server_uri, node), value)
}

/// Builds a method-call target.
pub fn call_target(server_uri: &str, object: u32, method: u32) -> MethodCallRequestTarget {
    MethodCallRequestTarget::new(address(server_uri, object), address(server_uri, method))
        .with_input_arguments(vec![UaValue::Int32(1)])
}
