// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client configuration store.
//!
//! The database is a read-only snapshot of the client configuration:
//! application identity, discovery URLs, housekeeping cadence, and the
//! default session and subscription settings substituted into requests
//! that carry none of their own.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use arcus_core::settings::{SessionSettings, SubscriptionSettings};

// =============================================================================
// ClientSettings
// =============================================================================

/// Static configuration of one client instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Application name announced to servers.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Application URI announced to servers.
    #[serde(default = "default_application_uri")]
    pub application_uri: String,

    /// Discovery URLs to query for servers.
    #[serde(default)]
    pub discovery_urls: Vec<String>,

    /// Interval at which housekeeping should run.
    #[serde(default = "default_housekeeping_interval")]
    #[serde(with = "humantime_serde")]
    pub housekeeping_interval: Duration,

    /// Session settings applied to requests that carry none.
    #[serde(default)]
    pub default_session_settings: SessionSettings,

    /// Subscription settings applied to requests that carry none.
    #[serde(default)]
    pub default_subscription_settings: SubscriptionSettings,
}

fn default_application_name() -> String {
    "ARCUS Client".to_string()
}

fn default_application_uri() -> String {
    "urn:arcus:client".to_string()
}

fn default_housekeeping_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            application_uri: default_application_uri(),
            discovery_urls: Vec::new(),
            housekeeping_interval: default_housekeeping_interval(),
            default_session_settings: SessionSettings::default(),
            default_subscription_settings: SubscriptionSettings::default(),
        }
    }
}

impl ClientSettings {
    /// Creates default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application name.
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Adds a discovery URL.
    pub fn with_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.discovery_urls.push(url.into());
        self
    }

    /// Sets the default session settings.
    pub fn with_default_session_settings(mut self, settings: SessionSettings) -> Self {
        self.default_session_settings = settings;
        self
    }

    /// Sets the default subscription settings.
    pub fn with_default_subscription_settings(
        mut self,
        settings: SubscriptionSettings,
    ) -> Self {
        self.default_subscription_settings = settings;
        self
    }
}

// =============================================================================
// Database
// =============================================================================

/// Read-only configuration store consulted by the session factory.
#[derive(Debug, Default)]
pub struct Database {
    settings: ClientSettings,
}

impl Database {
    /// Creates a database from client settings.
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }

    /// Returns the client settings.
    pub fn client_settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Returns a copy of the default session settings.
    pub fn default_session_settings(&self) -> SessionSettings {
        self.settings.default_session_settings.clone()
    }

    /// Returns a copy of the default subscription settings.
    pub fn default_subscription_settings(&self) -> SubscriptionSettings {
        self.settings.default_subscription_settings.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let database = Database::default();
        assert_eq!(database.client_settings().application_name, "ARCUS Client");
        assert_eq!(
            database.default_session_settings(),
            SessionSettings::default()
        );
    }

    #[test]
    fn test_builder_style() {
        let settings = ClientSettings::new()
            .with_application_name("Line Supervisor")
            .with_discovery_url("opc.tcp://discovery:4840");
        assert_eq!(settings.application_name, "Line Supervisor");
        assert_eq!(settings.discovery_urls.len(), 1);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let settings: ClientSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ClientSettings::default());

        let settings: ClientSettings =
            serde_json::from_str(r#"{"application_name": "Cell 7"}"#).unwrap();
        assert_eq!(settings.application_name, "Cell 7");
        assert_eq!(settings.housekeeping_interval, Duration::from_secs(5));
    }
}
