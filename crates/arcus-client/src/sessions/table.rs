// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The session table: live sessions and their activity counts.
//!
//! Sessions are shared across concurrent callers. Every acquisition bumps
//! the session's activity count and every release drops it; a session
//! whose count reaches zero may be collected. Two mutexes protect the
//! table, one for the session map and one for the activity map. Whenever
//! both are held, the session map is locked first; housekeeping relies on
//! that order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use arcus_core::error::{ClientError, ClientResult};
use arcus_core::settings::SessionSettings;
use arcus_core::types::ClientConnectionId;

use crate::discovery::{Discoverer, EndpointDescription};
use crate::sessions::session::{Session, SessionInformation};
use crate::transport::{SessionEventSink, TransportFactory};

// =============================================================================
// SessionTable
// =============================================================================

/// Owns every session of the client and counts their outstanding borrows.
pub struct SessionTable {
    /// Resolves server URIs to endpoints.
    discoverer: Arc<Discoverer>,

    /// Creates one transport per new session.
    transports: Arc<dyn TransportFactory>,

    /// Callback surface handed to new transports. Non-owning: the sink is
    /// the factory that owns this table.
    events: Weak<dyn SessionEventSink>,

    /// Next connection id.
    next_connection_id: AtomicU32,

    /// Client-wide subscription handle allocator, shared by all sessions.
    subscription_handles: Arc<AtomicU32>,

    /// Live sessions keyed by connection id. Lock before `activity`.
    sessions: Mutex<HashMap<ClientConnectionId, Arc<Session>>>,

    /// Activity counts keyed by connection id. Lock after `sessions`.
    activity: Mutex<HashMap<ClientConnectionId, u32>>,
}

impl SessionTable {
    /// Creates an empty table.
    pub fn new(
        discoverer: Arc<Discoverer>,
        transports: Arc<dyn TransportFactory>,
        events: Weak<dyn SessionEventSink>,
    ) -> Self {
        Self {
            discoverer,
            transports,
            events,
            next_connection_id: AtomicU32::new(1),
            subscription_handles: Arc::new(AtomicU32::new(1)),
            sessions: Mutex::new(HashMap::new()),
            activity: Mutex::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Acquisition
    // =========================================================================

    /// Acquires a session to `server_uri` with exactly the given settings,
    /// creating one when no structural match exists.
    ///
    /// A disconnected session is a valid acquisition: callers that need a
    /// live connection must check `is_connected` themselves. Creation
    /// resolves the server through discovery (a miss is a hard failure),
    /// inserts the new session with an activity count of one, and then
    /// makes a first connect attempt outside the table locks; a failed
    /// attempt still yields the session, and housekeeping retries it.
    pub async fn acquire_by_match(
        self: &Arc<Self>,
        server_uri: &str,
        settings: &SessionSettings,
    ) -> ClientResult<SessionLease> {
        if let Some(lease) = self.acquire_existing(server_uri, settings) {
            return Ok(lease);
        }

        // No match: resolve and build a new session before re-checking.
        let endpoints = self.discoverer.find_endpoints(server_uri)?;
        let endpoint = select_endpoint(&endpoints, settings)
            .ok_or_else(|| ClientError::discovery(server_uri))?;
        let connection_id =
            ClientConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::SeqCst));
        let transport = self.transports.create(
            server_uri,
            connection_id,
            settings,
            self.events.clone(),
        );
        let session = Arc::new(Session::new(
            connection_id,
            server_uri,
            settings.clone(),
            endpoint,
            transport,
            Arc::clone(&self.subscription_handles),
        ));

        {
            let mut sessions = self.sessions.lock();
            // A concurrent caller may have inserted an equal session while
            // we were building ours; prefer theirs.
            if let Some(existing) = sessions
                .values()
                .find(|s| s.server_uri() == server_uri && s.settings() == settings)
            {
                let existing = Arc::clone(existing);
                let mut activity = self.activity.lock();
                *activity.entry(existing.client_connection_id()).or_insert(0) += 1;
                return Ok(SessionLease::new(Arc::clone(self), existing));
            }

            sessions.insert(connection_id, Arc::clone(&session));
            let mut activity = self.activity.lock();
            activity.insert(connection_id, 1);
        }

        tracing::info!(
            connection_id = %connection_id,
            server_uri = %server_uri,
            "Created session"
        );

        if let Err(error) = session.connect().await {
            tracing::warn!(
                connection_id = %connection_id,
                server_uri = %server_uri,
                error = %error,
                "Initial connect attempt failed, housekeeping will retry"
            );
        }

        Ok(SessionLease::new(Arc::clone(self), session))
    }

    /// Acquires an existing session by connection id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownConnectionId`] if no session has the
    /// given id.
    pub fn acquire_by_id(
        self: &Arc<Self>,
        connection_id: ClientConnectionId,
    ) -> ClientResult<SessionLease> {
        let sessions = self.sessions.lock();
        let session = sessions
            .get(&connection_id)
            .cloned()
            .ok_or_else(|| ClientError::unknown_connection_id(connection_id))?;

        let mut activity = self.activity.lock();
        *activity.entry(connection_id).or_insert(0) += 1;

        Ok(SessionLease::new(Arc::clone(self), session))
    }

    fn acquire_existing(
        self: &Arc<Self>,
        server_uri: &str,
        settings: &SessionSettings,
    ) -> Option<SessionLease> {
        let sessions = self.sessions.lock();
        let session = sessions
            .values()
            .find(|s| s.server_uri() == server_uri && s.settings() == settings)?;

        let mut activity = self.activity.lock();
        *activity.entry(session.client_connection_id()).or_insert(0) += 1;

        Some(SessionLease::new(Arc::clone(self), Arc::clone(session)))
    }

    // =========================================================================
    // Release
    // =========================================================================

    /// Releases one borrow of `session`.
    ///
    /// When the activity count reaches zero, `allow_collect` is true and
    /// the session is not connected, the session is removed from the table
    /// and freed. A connected session survives at zero activity so later
    /// requests can reuse it; tearing the connection down first is what
    /// makes a release destroy it (see the manual disconnect path).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ReleaseUnderflow`] when the count is already
    /// zero; the count is left untouched.
    pub async fn release(
        &self,
        session: &Arc<Session>,
        allow_collect: bool,
    ) -> ClientResult<()> {
        let connection_id = session.client_connection_id();

        let collected = {
            let mut sessions = self.sessions.lock();
            let mut activity = self.activity.lock();

            let count = match activity.get_mut(&connection_id) {
                Some(count) if *count > 0 => count,
                _ => return Err(ClientError::release_underflow(connection_id)),
            };
            *count -= 1;

            if *count == 0 && allow_collect && !session.is_connected() {
                activity.remove(&connection_id);
                sessions.remove(&connection_id)
            } else {
                None
            }
        };

        if let Some(session) = collected {
            tracing::info!(
                connection_id = %connection_id,
                server_uri = %session.server_uri(),
                "Collecting idle session"
            );
            if let Err(error) = session.disconnect().await {
                tracing::warn!(
                    connection_id = %connection_id,
                    error = %error,
                    "Disconnect of collected session failed"
                );
            }
        }

        Ok(())
    }

    /// Drops one borrow without collecting. Backstop for leases that were
    /// dropped instead of released; the session lingers until
    /// [`delete_all`](Self::delete_all).
    pub(crate) fn release_abandoned(&self, session: &Arc<Session>) {
        let connection_id = session.client_connection_id();
        let mut activity = self.activity.lock();
        match activity.get_mut(&connection_id) {
            Some(count) if *count > 0 => *count -= 1,
            _ => tracing::error!(
                connection_id = %connection_id,
                "Abandoned lease released an idle session"
            ),
        }
    }

    // =========================================================================
    // Housekeeping and shutdown
    // =========================================================================

    /// Reconnects sessions that are disconnected while still referenced,
    /// or whose transport asked for a reconnect. Never destroys sessions;
    /// closed sessions are left alone.
    ///
    /// The candidate snapshot is taken under the table locks; the connect
    /// attempts themselves run with no lock held, so they cannot deadlock
    /// with dispatchers.
    pub async fn do_housekeeping(&self) {
        use crate::sessions::session::SessionState;

        let candidates: Vec<Arc<Session>> = {
            let sessions = self.sessions.lock();
            let activity = self.activity.lock();
            sessions
                .values()
                .filter(|session| {
                    let referenced = activity
                        .get(&session.client_connection_id())
                        .copied()
                        .unwrap_or(0)
                        > 0;
                    session.state() == SessionState::Disconnected
                        && (referenced || session.reconnect_requested())
                })
                .cloned()
                .collect()
        };

        for session in candidates {
            tracing::debug!(
                connection_id = %session.client_connection_id(),
                server_uri = %session.server_uri(),
                "Housekeeping reconnect attempt"
            );
            if let Err(error) = session.reconnect().await {
                tracing::warn!(
                    connection_id = %session.client_connection_id(),
                    error = %error,
                    "Housekeeping reconnect failed"
                );
            }
        }
    }

    /// Disconnects and frees every session regardless of activity counts.
    ///
    /// Callers still holding borrows must have been joined first;
    /// in-flight dispatchers over a drained table are undefined behaviour
    /// at the contract level (their leases release into the void).
    pub async fn delete_all(&self) {
        let drained: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.lock();
            let mut activity = self.activity.lock();
            activity.clear();
            sessions.drain().map(|(_, session)| session).collect()
        };

        tracing::info!(count = drained.len(), "Deleting all sessions");

        for session in drained {
            if let Err(error) = session.disconnect().await {
                tracing::warn!(
                    connection_id = %session.client_connection_id(),
                    error = %error,
                    "Disconnect during delete_all failed"
                );
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the session with the given id without touching its activity
    /// count.
    pub fn find(&self, connection_id: ClientConnectionId) -> Option<Arc<Session>> {
        self.sessions.lock().get(&connection_id).cloned()
    }

    /// Returns the activity count of a session, or `None` for unknown ids.
    pub fn activity(&self, connection_id: ClientConnectionId) -> Option<u32> {
        self.activity.lock().get(&connection_id).copied()
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Returns `true` if the table holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Returns a snapshot of one session.
    pub fn information(
        &self,
        connection_id: ClientConnectionId,
    ) -> ClientResult<SessionInformation> {
        self.find(connection_id)
            .map(|session| session.information())
            .ok_or_else(|| ClientError::unknown_connection_id(connection_id))
    }

    /// Returns snapshots of all sessions.
    pub fn all_informations(&self) -> Vec<SessionInformation> {
        self.sessions
            .lock()
            .values()
            .map(|session| session.information())
            .collect()
    }
}

impl std::fmt::Debug for SessionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTable")
            .field("sessions", &self.len())
            .finish()
    }
}

/// Picks the endpoint whose security matches the requested settings,
/// falling back to the first one offered.
fn select_endpoint(
    endpoints: &[EndpointDescription],
    settings: &SessionSettings,
) -> Option<EndpointDescription> {
    endpoints
        .iter()
        .find(|e| {
            e.security_policy == settings.security_policy
                && e.security_mode == settings.security_mode
        })
        .or_else(|| endpoints.first())
        .cloned()
}

// =============================================================================
// SessionLease
// =============================================================================

/// A counted borrow of one session.
///
/// The lease keeps the session's activity count raised until it is
/// released. [`release`](Self::release) is the intended path and may
/// collect the session; [`detach`](Self::detach) keeps the count raised
/// deliberately (manual connects). A lease that is merely dropped gives
/// its count back without collecting.
#[must_use = "an unreleased lease pins the session's activity count"]
pub struct SessionLease {
    table: Arc<SessionTable>,
    session: Arc<Session>,
    allow_collect: bool,
    settled: bool,
}

impl SessionLease {
    fn new(table: Arc<SessionTable>, session: Arc<Session>) -> Self {
        Self {
            table,
            session,
            allow_collect: true,
            settled: false,
        }
    }

    /// Returns the leased session.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Disables collection on release: the session survives even when
    /// this was the last borrow.
    pub fn without_collection(mut self) -> Self {
        self.allow_collect = false;
        self
    }

    /// Releases the borrow, collecting the session when it was the last
    /// one and collection is allowed.
    pub async fn release(mut self) -> ClientResult<()> {
        self.settled = true;
        let table = Arc::clone(&self.table);
        let session = Arc::clone(&self.session);
        table.release(&session, self.allow_collect).await
    }

    /// Keeps the activity count raised and returns the session. The pin
    /// lasts until a matching [`SessionTable::release`], as performed by
    /// a manual disconnect.
    pub fn detach(mut self) -> Arc<Session> {
        self.settled = true;
        Arc::clone(&self.session)
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                connection_id = %self.session.client_connection_id(),
                "Session lease dropped without release"
            );
            self.table.release_abandoned(&self.session);
        }
    }
}

impl std::fmt::Debug for SessionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLease")
            .field("connection_id", &self.session.client_connection_id())
            .field("allow_collect", &self.allow_collect)
            .finish()
    }
}
