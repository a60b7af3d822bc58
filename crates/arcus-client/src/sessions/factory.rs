// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The session factory.
//!
//! The factory turns typed requests into per-server invocations, drives
//! them on sessions from the [`SessionTable`], and correlates asynchronous
//! completions back to the caller through the [`TransactionRegistry`] and
//! the client interface. It also exposes the manual connect/subscribe
//! surface and the read-only information queries.
//!
//! # Concurrency
//!
//! The factory is driven by caller tasks (`invoke`), a periodic
//! housekeeping task, and transport tasks delivering completions. The
//! session map, activity map and transaction registry are the only shared
//! state; their lock order is session map, then activity map, then
//! registry. Transport callbacks take short locks only.

use std::sync::{Arc, Weak};

use async_trait::async_trait;

use arcus_core::error::{ClientError, ClientResult};
use arcus_core::settings::{SessionSettings, SubscriptionSettings};
use arcus_core::status::StatusCode;
use arcus_core::types::{
    ClientConnectionId, ClientSubscriptionHandle, DataValue, Mask, TransactionId,
};

use crate::database::Database;
use crate::discovery::Discoverer;
use crate::interface::{ClientInterface, ServerStatus};
use crate::services::requests::{RequestKind, UaRequest};
use crate::services::results::{
    MethodCallResult, MethodCallResultTarget, ReadResult, ReadResultTarget, ServiceResult,
    WriteResult, WriteResultTarget,
};
use crate::services::{invocations::ServiceInvocation, InvocationFactory, Service};
use crate::sessions::session::SessionInformation;
use crate::sessions::table::SessionTable;
use crate::sessions::transactions::TransactionRegistry;
use crate::subscriptions::SubscriptionInformation;
use crate::transport::{CallResponse, DiagnosticInfo, SessionEventSink, TransportFactory};

// =============================================================================
// SessionFactory
// =============================================================================

/// Creates, owns and dispatches onto sessions.
pub struct SessionFactory {
    /// Client configuration store.
    database: Arc<Database>,

    /// Completion sink of the embedding application.
    client_interface: Arc<dyn ClientInterface>,

    /// Live sessions and activity counts.
    sessions: Arc<SessionTable>,

    /// Transaction id allocation and correlation.
    transactions: TransactionRegistry,
}

impl SessionFactory {
    /// Creates a session factory.
    ///
    /// The factory is returned in an `Arc` because it is the callback
    /// surface of every transport it creates: sessions and transports
    /// hold a non-owning reference back to it, never an owning one.
    pub fn new(
        database: Arc<Database>,
        discoverer: Arc<Discoverer>,
        client_interface: Arc<dyn ClientInterface>,
        transports: Arc<dyn TransportFactory>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<SessionFactory>| {
            let events: Weak<dyn SessionEventSink> = weak.clone();
            Self {
                database,
                client_interface,
                sessions: Arc::new(SessionTable::new(discoverer, transports, events)),
                transactions: TransactionRegistry::new(),
            }
        })
    }

    /// Returns the session table.
    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    /// Returns the number of transaction bindings awaiting completion.
    pub fn pending_transactions(&self) -> usize {
        self.transactions.len()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Invokes a request.
    ///
    /// The request is split into one invocation per addressed server;
    /// each invocation acquires a session, executes on it and releases
    /// it. The first failure stops the iteration and becomes the result
    /// of the whole request; work already forwarded is not rolled back.
    ///
    /// Asynchronous session-level requests additionally bind a
    /// transaction id first, and must map onto a single session; their
    /// per-target data arrives later through the client interface.
    pub async fn invoke<S: Service>(
        &self,
        request: &S::Request,
        mask: &Mask,
    ) -> ClientResult<S::Result> {
        tracing::debug!(
            service = S::NAME,
            request_handle = %request.request_handle(),
            targets = request.targets().len(),
            mask = %mask,
            "Invoking request"
        );

        let mut result = S::Result::default();
        result.prepare(request.request_handle(), request.targets().len());

        // Subscription-level requests correlate one level down; only
        // session-level asynchronous requests bind here.
        let transaction_id = if S::ASYNCHRONOUS && request.kind() == RequestKind::Session {
            let id = self.transactions.begin(request.request_handle());
            tracing::debug!(
                transaction_id = %id,
                request_handle = %request.request_handle(),
                "Bound transaction"
            );
            Some(id)
        } else {
            None
        };

        match self.dispatch::<S>(request, mask, transaction_id, &mut result).await {
            Ok(()) => Ok(result),
            Err(error) => {
                if let Some(id) = transaction_id {
                    tracing::debug!(
                        transaction_id = %id,
                        error = %error,
                        "Rolling back transaction binding"
                    );
                    self.transactions.erase(id);
                }
                Err(error)
            }
        }
    }

    async fn dispatch<S: Service>(
        &self,
        request: &S::Request,
        mask: &Mask,
        transaction_id: Option<TransactionId>,
        result: &mut S::Result,
    ) -> ClientResult<()> {
        let settings = request
            .session_settings()
            .cloned()
            .unwrap_or_else(|| self.database.default_session_settings());

        let mut factory = InvocationFactory::<S>::new();
        factory.create(request, &settings, result, mask)?;

        tracing::debug!(
            service = S::NAME,
            invocations = factory.invocations.len(),
            "Built invocations"
        );

        // Reassembling one result from several asynchronous completions is
        // not implemented, so an asynchronous request must fit one session.
        if S::ASYNCHRONOUS && factory.invocations.len() > 1 {
            return Err(ClientError::unsupported(
                "asynchronous requests must map onto a single session",
            ));
        }

        for (server_uri, invocation) in factory.invocations.iter_mut() {
            if let Some(id) = transaction_id {
                invocation.set_transaction_id(id);
            }

            let lease = self
                .sessions
                .acquire_by_match(server_uri, invocation.session_settings())
                .await?;
            let session = Arc::clone(lease.session());

            invocation.set_session_information(session.information());

            let mut step = if session.is_connected() {
                tracing::debug!(
                    service = S::NAME,
                    connection_id = %session.client_connection_id(),
                    "Forwarding invocation"
                );
                invocation.forward(&session).await
            } else {
                Err(ClientError::not_connected(
                    session.client_connection_id(),
                    session.server_uri(),
                ))
            };

            if !S::ASYNCHRONOUS && step.is_ok() {
                step = invocation.copy_to_result(result);
            }

            lease.release().await?;
            step?;
        }

        Ok(())
    }

    // =========================================================================
    // Housekeeping and shutdown
    // =========================================================================

    /// Reconnects sessions that were disconnected while still referenced.
    /// Called periodically by a timer the factory does not own.
    pub async fn do_housekeeping(&self) {
        self.sessions.do_housekeeping().await;
    }

    /// Disconnects and frees every session. Callers must have quiesced
    /// all dispatchers first.
    pub async fn delete_all_sessions(&self) {
        self.sessions.delete_all().await;
    }

    // =========================================================================
    // Manual control
    // =========================================================================

    /// Connects to a server and pins the session until
    /// [`manually_disconnect`](Self::manually_disconnect).
    ///
    /// The pin is the acquisition itself: the activity count stays raised,
    /// so the session cannot be collected behind the caller's back.
    pub async fn manually_connect(
        &self,
        server_uri: &str,
        settings: &SessionSettings,
    ) -> ClientResult<ClientConnectionId> {
        let lease = self.sessions.acquire_by_match(server_uri, settings).await?;
        let session = lease.detach();
        let connection_id = session.client_connection_id();

        tracing::info!(
            connection_id = %connection_id,
            server_uri = %server_uri,
            "Manually connected"
        );

        Ok(connection_id)
    }

    /// Disconnects a manually connected session and releases its pin,
    /// destroying the session when the pin was the last borrow.
    pub async fn manually_disconnect(
        &self,
        connection_id: ClientConnectionId,
    ) -> ClientResult<()> {
        let session = self
            .sessions
            .find(connection_id)
            .ok_or_else(|| ClientError::unknown_connection_id(connection_id))?;

        if let Err(error) = session.disconnect().await {
            tracing::warn!(
                connection_id = %connection_id,
                error = %error,
                "Disconnect during manual disconnect failed"
            );
        }

        self.sessions.release(&session, true).await
    }

    /// Creates a subscription on the session with the given id.
    ///
    /// The session's activity count is untouched; subscriptions hold
    /// their own bookkeeping.
    pub async fn manually_subscribe(
        &self,
        connection_id: ClientConnectionId,
        settings: &SubscriptionSettings,
    ) -> ClientResult<ClientSubscriptionHandle> {
        let session = self
            .sessions
            .find(connection_id)
            .ok_or_else(|| ClientError::unknown_connection_id(connection_id))?;
        session.create_subscription(settings).await
    }

    /// Deletes a subscription from the session with the given id.
    pub async fn manually_unsubscribe(
        &self,
        connection_id: ClientConnectionId,
        handle: ClientSubscriptionHandle,
    ) -> ClientResult<()> {
        let session = self
            .sessions
            .find(connection_id)
            .ok_or_else(|| ClientError::unknown_connection_id(connection_id))?;
        session.delete_subscription(handle).await
    }

    // =========================================================================
    // Information queries
    // =========================================================================

    /// Returns a snapshot of one session.
    pub fn session_information(
        &self,
        connection_id: ClientConnectionId,
    ) -> ClientResult<SessionInformation> {
        self.sessions.information(connection_id)
    }

    /// Returns snapshots of all sessions.
    pub fn all_session_informations(&self) -> Vec<SessionInformation> {
        self.sessions.all_informations()
    }

    /// Returns a snapshot of one subscription, searching all sessions.
    pub fn subscription_information(
        &self,
        handle: ClientSubscriptionHandle,
    ) -> ClientResult<SubscriptionInformation> {
        for information in self.all_subscription_informations() {
            if information.client_subscription_handle == handle {
                return Ok(information);
            }
        }
        Err(ClientError::unknown_subscription_handle(handle))
    }

    /// Returns snapshots of all subscriptions of all sessions.
    pub fn all_subscription_informations(&self) -> Vec<SubscriptionInformation> {
        let mut informations = Vec::new();
        for session in self
            .sessions
            .all_informations()
            .iter()
            .filter_map(|info| self.sessions.find(info.client_connection_id))
        {
            informations.extend(session.subscriptions().all_informations());
        }
        informations
    }
}

impl std::fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactory")
            .field("sessions", &self.sessions.len())
            .field("pending_transactions", &self.transactions.len())
            .finish()
    }
}

// =============================================================================
// Callback router
// =============================================================================

/// Routes transport events back to sessions and to the client interface.
///
/// Completions are correlated through the transaction registry; a
/// completion whose transaction is no longer bound (rolled back, or
/// delivered after shutdown) is logged and dropped, as is a status change
/// for a session that no longer exists.
#[async_trait]
impl SessionEventSink for SessionFactory {
    async fn connection_status_changed(
        &self,
        connection_id: ClientConnectionId,
        status: ServerStatus,
    ) {
        let session = match self.sessions.find(connection_id) {
            Some(session) => session,
            None => {
                tracing::debug!(
                    connection_id = %connection_id,
                    status = %status,
                    "Status change for unknown session dropped"
                );
                return;
            }
        };

        session.apply_server_status(status);
        self.client_interface
            .connection_status_changed(session.information(), status)
            .await;
    }

    async fn read_complete(
        &self,
        transaction_id: TransactionId,
        status: StatusCode,
        values: Vec<DataValue>,
        _diagnostics: Vec<DiagnosticInfo>,
    ) {
        let request_handle = match self.transactions.take(transaction_id) {
            Some(handle) => handle,
            None => {
                tracing::debug!(
                    transaction_id = %transaction_id,
                    "Read completion without binding dropped"
                );
                return;
            }
        };

        let result = ReadResult {
            request_handle,
            overall_status: status,
            targets: values.into_iter().map(ReadResultTarget::from).collect(),
        };
        self.client_interface.read_complete(result).await;
    }

    async fn write_complete(
        &self,
        transaction_id: TransactionId,
        status: StatusCode,
        results: Vec<StatusCode>,
        _diagnostics: Vec<DiagnosticInfo>,
    ) {
        let request_handle = match self.transactions.take(transaction_id) {
            Some(handle) => handle,
            None => {
                tracing::debug!(
                    transaction_id = %transaction_id,
                    "Write completion without binding dropped"
                );
                return;
            }
        };

        let result = WriteResult {
            request_handle,
            overall_status: status,
            targets: results
                .into_iter()
                .map(|status| WriteResultTarget { status })
                .collect(),
        };
        self.client_interface.write_complete(result).await;
    }

    async fn call_complete(
        &self,
        transaction_id: TransactionId,
        status: StatusCode,
        responses: Vec<CallResponse>,
    ) {
        let request_handle = match self.transactions.take(transaction_id) {
            Some(handle) => handle,
            None => {
                tracing::debug!(
                    transaction_id = %transaction_id,
                    "Call completion without binding dropped"
                );
                return;
            }
        };

        let result = MethodCallResult {
            request_handle,
            overall_status: status,
            targets: responses
                .into_iter()
                .map(MethodCallResultTarget::from)
                .collect(),
        };
        self.client_interface.call_complete(result).await;
    }
}
