// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! One session to one server.
//!
//! A session owns the transport that speaks to its server and caches the
//! connection state the transport last reported, so state checks never
//! need to touch the transport lock. The session factory owns every
//! session; callers only ever borrow one between acquire and release.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use arcus_core::error::ClientResult;
use arcus_core::settings::{SessionSettings, SubscriptionSettings};
use arcus_core::status::StatusCode;
use arcus_core::types::{ClientConnectionId, ClientSubscriptionHandle, DataValue, TransactionId};

use crate::discovery::EndpointDescription;
use crate::interface::ServerStatus;
use crate::subscriptions::{CreatedMonitoredItem, SubscriptionFactory};
use crate::transport::{
    CallMethodRequest, CallResponse, MonitoredItemRequest, ReadValueId, SessionTransport,
    WriteValue,
};

// =============================================================================
// SessionState
// =============================================================================

/// Cached connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// The session is not connected.
    #[default]
    Disconnected,

    /// A connect attempt is in progress.
    Connecting,

    /// The session is connected.
    Connected,

    /// A reconnect attempt is in progress.
    Reconnecting,

    /// The session was shut down and will not reconnect.
    Closed,
}

impl SessionState {
    /// Returns `true` if services can be invoked.
    #[inline]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if a connect or reconnect is in progress.
    #[inline]
    pub const fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Reconnecting)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// =============================================================================
// SessionInformation
// =============================================================================

/// Read-only snapshot of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInformation {
    /// Factory-assigned connection id.
    pub client_connection_id: ClientConnectionId,

    /// URI of the server the session talks to.
    pub server_uri: String,

    /// Cached connection state.
    pub session_state: SessionState,

    /// Last status the transport reported.
    pub last_server_status: ServerStatus,

    /// The settings the session was created with.
    pub settings: SessionSettings,

    /// Number of connect attempts made so far.
    pub connect_attempts: u64,

    /// Number of live subscriptions.
    pub subscription_count: usize,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Session
// =============================================================================

/// A logical, persistent connection to one server.
pub struct Session {
    /// Factory-assigned id, stable for the process lifetime.
    client_connection_id: ClientConnectionId,

    /// URI of the server.
    server_uri: String,

    /// The settings the session was created with.
    settings: SessionSettings,

    /// Endpoint selected from discovery.
    endpoint: EndpointDescription,

    /// The wire backend. Lifecycle calls take `&mut`, hence the mutex.
    transport: Mutex<Box<dyn SessionTransport>>,

    /// Cached connection state, updated by lifecycle calls and by status
    /// events from the transport.
    state: RwLock<SessionState>,

    /// Last status the transport reported.
    last_status: RwLock<ServerStatus>,

    /// Set when the transport asked for a reconnect; cleared when one
    /// succeeds.
    reconnect_requested: AtomicBool,

    /// Number of connect attempts.
    connect_attempts: AtomicU64,

    /// Creation time.
    created_at: DateTime<Utc>,

    /// Subscriptions hosted by this session.
    subscriptions: SubscriptionFactory,
}

impl Session {
    /// Creates a disconnected session.
    pub fn new(
        client_connection_id: ClientConnectionId,
        server_uri: impl Into<String>,
        settings: SessionSettings,
        endpoint: EndpointDescription,
        transport: Box<dyn SessionTransport>,
        subscription_handles: Arc<AtomicU32>,
    ) -> Self {
        Self {
            client_connection_id,
            server_uri: server_uri.into(),
            settings,
            endpoint,
            transport: Mutex::new(transport),
            state: RwLock::new(SessionState::Disconnected),
            last_status: RwLock::new(ServerStatus::Disconnected),
            reconnect_requested: AtomicBool::new(false),
            connect_attempts: AtomicU64::new(0),
            created_at: Utc::now(),
            subscriptions: SubscriptionFactory::new(client_connection_id, subscription_handles),
        }
    }

    /// Returns the factory-assigned connection id.
    pub fn client_connection_id(&self) -> ClientConnectionId {
        self.client_connection_id
    }

    /// Returns the server URI.
    pub fn server_uri(&self) -> &str {
        &self.server_uri
    }

    /// Returns the session settings.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Returns the cached connection state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Returns `true` if the cached state allows service invocation.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns `true` if the transport asked for a reconnect.
    pub fn reconnect_requested(&self) -> bool {
        self.reconnect_requested.load(Ordering::SeqCst)
    }

    /// Returns the subscription bookkeeping of this session.
    pub fn subscriptions(&self) -> &SubscriptionFactory {
        &self.subscriptions
    }

    /// Returns a read-only snapshot of the session.
    pub fn information(&self) -> SessionInformation {
        SessionInformation {
            client_connection_id: self.client_connection_id,
            server_uri: self.server_uri.clone(),
            session_state: self.state(),
            last_server_status: *self.last_status.read(),
            settings: self.settings.clone(),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            subscription_count: self.subscriptions.len(),
            created_at: self.created_at,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Attempts to connect to the selected endpoint.
    pub async fn connect(&self) -> ClientResult<()> {
        *self.state.write() = SessionState::Connecting;
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);

        let mut transport = self.transport.lock().await;
        match transport.connect(&self.endpoint).await {
            Ok(()) => {
                *self.state.write() = SessionState::Connected;
                tracing::info!(
                    connection_id = %self.client_connection_id,
                    server_uri = %self.server_uri,
                    endpoint = %self.endpoint.endpoint_url,
                    "Session connected"
                );
                Ok(())
            }
            Err(error) => {
                *self.state.write() = SessionState::Disconnected;
                Err(error)
            }
        }
    }

    /// Disconnects the session for good. Idempotent: closing a closed
    /// session is a no-op.
    pub async fn disconnect(&self) -> ClientResult<()> {
        if self.state() == SessionState::Closed {
            return Ok(());
        }

        let mut transport = self.transport.lock().await;
        let outcome = transport.disconnect().await;
        *self.state.write() = SessionState::Closed;
        tracing::info!(
            connection_id = %self.client_connection_id,
            server_uri = %self.server_uri,
            "Session disconnected"
        );
        outcome
    }

    /// Tears the connection down and attempts to establish it again.
    pub async fn reconnect(&self) -> ClientResult<()> {
        *self.state.write() = SessionState::Reconnecting;
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);

        let mut transport = self.transport.lock().await;
        transport.disconnect().await.ok();
        match transport.connect(&self.endpoint).await {
            Ok(()) => {
                *self.state.write() = SessionState::Connected;
                self.reconnect_requested.store(false, Ordering::SeqCst);
                tracing::info!(
                    connection_id = %self.client_connection_id,
                    server_uri = %self.server_uri,
                    "Session reconnected"
                );
                Ok(())
            }
            Err(error) => {
                *self.state.write() = SessionState::Disconnected;
                Err(error)
            }
        }
    }

    /// Applies a status event reported by the transport.
    pub fn apply_server_status(&self, status: ServerStatus) {
        *self.last_status.write() = status;

        if status.wants_reconnect() {
            self.reconnect_requested.store(true, Ordering::SeqCst);
        }

        let mut state = self.state.write();
        if status.is_connected() {
            *state = SessionState::Connected;
        } else if matches!(
            status,
            ServerStatus::Disconnected
                | ServerStatus::ServerShutdown
                | ServerStatus::ConnectionErrorApiReconnect
        ) {
            // A watchdog warning leaves the cached state untouched.
            *state = SessionState::Disconnected;
        }

        tracing::debug!(
            connection_id = %self.client_connection_id,
            status = %status,
            state = %*state,
            "Applied server status"
        );
    }

    // =========================================================================
    // Service entry points
    // =========================================================================

    /// Reads the given nodes synchronously.
    pub async fn read(&self, nodes: &[ReadValueId]) -> ClientResult<Vec<DataValue>> {
        let transport = self.transport.lock().await;
        transport.read(nodes).await
    }

    /// Writes the given values synchronously.
    pub async fn write(&self, values: &[WriteValue]) -> ClientResult<Vec<StatusCode>> {
        let transport = self.transport.lock().await;
        transport.write(values).await
    }

    /// Calls the given methods synchronously.
    pub async fn call(&self, requests: &[CallMethodRequest]) -> ClientResult<Vec<CallResponse>> {
        let transport = self.transport.lock().await;
        transport.call(requests).await
    }

    /// Submits an asynchronous read.
    pub async fn begin_read(
        &self,
        transaction_id: TransactionId,
        nodes: &[ReadValueId],
    ) -> ClientResult<()> {
        let transport = self.transport.lock().await;
        transport.begin_read(transaction_id, nodes).await
    }

    /// Submits an asynchronous write.
    pub async fn begin_write(
        &self,
        transaction_id: TransactionId,
        values: &[WriteValue],
    ) -> ClientResult<()> {
        let transport = self.transport.lock().await;
        transport.begin_write(transaction_id, values).await
    }

    /// Submits an asynchronous method call.
    pub async fn begin_call(
        &self,
        transaction_id: TransactionId,
        requests: &[CallMethodRequest],
    ) -> ClientResult<()> {
        let transport = self.transport.lock().await;
        transport.begin_call(transaction_id, requests).await
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Creates a subscription with the given settings.
    pub async fn create_subscription(
        &self,
        settings: &SubscriptionSettings,
    ) -> ClientResult<ClientSubscriptionHandle> {
        let revised = {
            let transport = self.transport.lock().await;
            transport.create_subscription(settings).await?
        };
        Ok(self.subscriptions.register(settings.clone(), &revised))
    }

    /// Deletes a subscription by handle.
    pub async fn delete_subscription(
        &self,
        handle: ClientSubscriptionHandle,
    ) -> ClientResult<()> {
        let server_id = self.subscriptions.server_subscription_id(handle)?;
        {
            let transport = self.transport.lock().await;
            transport.delete_subscription(server_id).await?;
        }
        self.subscriptions.remove(handle)?;
        Ok(())
    }

    /// Creates monitored items on a subscription with the given settings,
    /// creating the subscription first when no matching one exists.
    pub async fn create_monitored_data(
        &self,
        settings: &SubscriptionSettings,
        items: &[MonitoredItemRequest],
    ) -> ClientResult<Vec<CreatedMonitoredItem>> {
        let handle = match self.subscriptions.find_by_settings(settings) {
            Some(handle) => handle,
            None => {
                let revised = {
                    let transport = self.transport.lock().await;
                    transport.create_subscription(settings).await?
                };
                self.subscriptions.register(settings.clone(), &revised)
            }
        };

        let server_id = self.subscriptions.server_subscription_id(handle)?;
        let results = {
            let transport = self.transport.lock().await;
            transport.create_monitored_items(server_id, items).await?
        };

        let mut created = Vec::with_capacity(results.len());
        let mut good = 0;
        for result in results {
            let monitored_item_id = if result.status.is_good() {
                good += 1;
                Some(self.subscriptions.next_monitored_item_id())
            } else {
                None
            };
            created.push(CreatedMonitoredItem {
                status: result.status,
                monitored_item_id,
                revised_sampling_interval: result.revised_sampling_interval,
                revised_queue_size: result.revised_queue_size,
            });
        }
        self.subscriptions.add_monitored_items(handle, good);

        Ok(created)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("client_connection_id", &self.client_connection_id)
            .field("server_uri", &self.server_uri)
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state() {
        assert!(SessionState::Connected.is_connected());
        assert!(!SessionState::Disconnected.is_connected());
        assert!(SessionState::Connecting.is_transitioning());
        assert!(SessionState::Reconnecting.is_transitioning());
        assert!(!SessionState::Closed.is_transitioning());
        assert_eq!(SessionState::default(), SessionState::Disconnected);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Reconnecting.to_string(), "Reconnecting");
    }
}
