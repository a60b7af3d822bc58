// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-session subscription bookkeeping.
//!
//! Every session owns one [`SubscriptionFactory`]. The factory records the
//! subscriptions created on its session, hands out client-side handles
//! (unique across the whole client, the allocator is shared by all
//! sessions), and answers information queries. The session itself drives
//! the transport; the factory never performs I/O.
//!
//! Monitored-data requests reuse an existing subscription whose settings
//! are structurally equal to the requested ones, mirroring how the session
//! table reuses sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use arcus_core::error::{ClientError, ClientResult};
use arcus_core::settings::SubscriptionSettings;
use arcus_core::status::StatusCode;
use arcus_core::types::{ClientConnectionId, ClientSubscriptionHandle, MonitoredItemId};

use crate::transport::RevisedSubscription;

// =============================================================================
// CreatedMonitoredItem
// =============================================================================

/// Outcome of creating one monitored item.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedMonitoredItem {
    /// Status of the creation.
    pub status: StatusCode,

    /// Client-side item id, assigned only when creation succeeded.
    pub monitored_item_id: Option<MonitoredItemId>,

    /// Revised sampling interval.
    pub revised_sampling_interval: Duration,

    /// Revised queue size.
    pub revised_queue_size: u32,
}

// =============================================================================
// SubscriptionRecord
// =============================================================================

/// Book-keeping entry for one live subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    /// Client-assigned handle.
    pub handle: ClientSubscriptionHandle,

    /// Server-assigned subscription id.
    pub server_subscription_id: u32,

    /// The settings the subscription was created with.
    pub settings: SubscriptionSettings,

    /// Publishing interval as revised by the server.
    pub revised_publishing_interval: Duration,

    /// Number of monitored items on the subscription.
    pub monitored_item_count: usize,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SubscriptionInformation
// =============================================================================

/// Read-only snapshot of one subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionInformation {
    /// Id of the session hosting the subscription.
    pub client_connection_id: ClientConnectionId,

    /// Client-assigned handle.
    pub client_subscription_handle: ClientSubscriptionHandle,

    /// The settings the subscription was created with.
    pub settings: SubscriptionSettings,

    /// Publishing interval as revised by the server.
    #[serde(with = "humantime_serde")]
    pub revised_publishing_interval: Duration,

    /// Number of monitored items on the subscription.
    pub monitored_item_count: usize,

    /// Creation time.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SubscriptionFactory
// =============================================================================

/// Records and looks up the subscriptions of one session.
#[derive(Debug)]
pub struct SubscriptionFactory {
    /// Id of the owning session.
    connection_id: ClientConnectionId,

    /// Client-wide handle allocator, shared across sessions.
    handles: Arc<AtomicU32>,

    /// Monitored item id allocator, scoped to this session.
    next_item_id: AtomicU32,

    /// Live subscriptions keyed by handle.
    records: RwLock<HashMap<ClientSubscriptionHandle, SubscriptionRecord>>,
}

impl SubscriptionFactory {
    /// Creates an empty factory for the given session.
    pub fn new(connection_id: ClientConnectionId, handles: Arc<AtomicU32>) -> Self {
        Self {
            connection_id,
            handles,
            next_item_id: AtomicU32::new(1),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Records a subscription created on the transport and returns its
    /// client-assigned handle.
    pub fn register(
        &self,
        settings: SubscriptionSettings,
        revised: &RevisedSubscription,
    ) -> ClientSubscriptionHandle {
        let handle = ClientSubscriptionHandle::new(self.handles.fetch_add(1, Ordering::SeqCst));
        let record = SubscriptionRecord {
            handle,
            server_subscription_id: revised.server_subscription_id,
            settings,
            revised_publishing_interval: revised.revised_publishing_interval,
            monitored_item_count: 0,
            created_at: Utc::now(),
        };
        self.records.write().insert(handle, record);
        tracing::debug!(
            connection_id = %self.connection_id,
            handle = %handle,
            "Registered subscription"
        );
        handle
    }

    /// Removes a subscription record.
    pub fn remove(&self, handle: ClientSubscriptionHandle) -> ClientResult<SubscriptionRecord> {
        self.records
            .write()
            .remove(&handle)
            .ok_or_else(|| ClientError::unknown_subscription_handle(handle))
    }

    /// Returns the server-side id of a subscription.
    pub fn server_subscription_id(&self, handle: ClientSubscriptionHandle) -> ClientResult<u32> {
        self.records
            .read()
            .get(&handle)
            .map(|r| r.server_subscription_id)
            .ok_or_else(|| ClientError::unknown_subscription_handle(handle))
    }

    /// Returns the handle of a subscription with structurally equal
    /// settings, if one exists.
    pub fn find_by_settings(
        &self,
        settings: &SubscriptionSettings,
    ) -> Option<ClientSubscriptionHandle> {
        self.records
            .read()
            .values()
            .find(|r| &r.settings == settings)
            .map(|r| r.handle)
    }

    /// Allocates a client-side monitored item id.
    pub fn next_monitored_item_id(&self) -> MonitoredItemId {
        MonitoredItemId::new(self.next_item_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Adds to a subscription's monitored item count.
    pub fn add_monitored_items(&self, handle: ClientSubscriptionHandle, count: usize) {
        if let Some(record) = self.records.write().get_mut(&handle) {
            record.monitored_item_count += count;
        }
    }

    /// Returns `true` if the handle refers to a live subscription.
    pub fn contains(&self, handle: ClientSubscriptionHandle) -> bool {
        self.records.read().contains_key(&handle)
    }

    /// Returns the number of live subscriptions.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if the session has no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns a snapshot of one subscription.
    pub fn information(
        &self,
        handle: ClientSubscriptionHandle,
    ) -> ClientResult<SubscriptionInformation> {
        self.records
            .read()
            .get(&handle)
            .map(|r| self.snapshot(r))
            .ok_or_else(|| ClientError::unknown_subscription_handle(handle))
    }

    /// Returns snapshots of all subscriptions.
    pub fn all_informations(&self) -> Vec<SubscriptionInformation> {
        self.records.read().values().map(|r| self.snapshot(r)).collect()
    }

    fn snapshot(&self, record: &SubscriptionRecord) -> SubscriptionInformation {
        SubscriptionInformation {
            client_connection_id: self.connection_id,
            client_subscription_handle: record.handle,
            settings: record.settings.clone(),
            revised_publishing_interval: record.revised_publishing_interval,
            monitored_item_count: record.monitored_item_count,
            created_at: record.created_at,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn revised(id: u32) -> RevisedSubscription {
        RevisedSubscription {
            server_subscription_id: id,
            revised_publishing_interval: Duration::from_millis(500),
            revised_lifetime_count: 1200,
            revised_max_keepalive_count: 5,
        }
    }

    fn factory() -> SubscriptionFactory {
        SubscriptionFactory::new(ClientConnectionId::new(1), Arc::new(AtomicU32::new(1)))
    }

    #[test]
    fn test_register_and_remove() {
        let factory = factory();
        let handle = factory.register(SubscriptionSettings::default(), &revised(10));
        assert!(factory.contains(handle));
        assert_eq!(factory.server_subscription_id(handle).unwrap(), 10);

        let record = factory.remove(handle).unwrap();
        assert_eq!(record.server_subscription_id, 10);
        assert!(factory.is_empty());

        let error = factory.remove(handle).unwrap_err();
        assert!(matches!(error, ClientError::UnknownSubscriptionHandle { .. }));
    }

    #[test]
    fn test_find_by_settings_is_structural() {
        let factory = factory();
        let settings = SubscriptionSettings::default().with_priority(3);
        let handle = factory.register(settings.clone(), &revised(1));

        assert_eq!(factory.find_by_settings(&settings), Some(handle));
        assert_eq!(
            factory.find_by_settings(&SubscriptionSettings::default()),
            None
        );
    }

    #[test]
    fn test_handles_shared_across_factories() {
        let allocator = Arc::new(AtomicU32::new(1));
        let a = SubscriptionFactory::new(ClientConnectionId::new(1), Arc::clone(&allocator));
        let b = SubscriptionFactory::new(ClientConnectionId::new(2), allocator);

        let ha = a.register(SubscriptionSettings::default(), &revised(1));
        let hb = b.register(SubscriptionSettings::default(), &revised(2));
        assert_ne!(ha, hb);
    }

    #[test]
    fn test_information_snapshot() {
        let factory = factory();
        let handle = factory.register(SubscriptionSettings::default(), &revised(5));
        factory.add_monitored_items(handle, 3);

        let info = factory.information(handle).unwrap();
        assert_eq!(info.client_connection_id, ClientConnectionId::new(1));
        assert_eq!(info.monitored_item_count, 3);
        assert_eq!(factory.all_informations().len(), 1);
    }
}
