// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session and subscription settings.
//!
//! Settings compare structurally: two sessions (or subscriptions) match
//! only when every field is equal. Session reuse in the session table and
//! subscription reuse in the subscription factory both depend on this.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// =============================================================================
// SecurityPolicy
// =============================================================================

/// OPC UA security policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityPolicy {
    /// No security.
    #[default]
    None,

    /// Basic128Rsa15 (deprecated but still deployed).
    Basic128Rsa15,

    /// Basic256.
    Basic256,

    /// Basic256Sha256.
    Basic256Sha256,

    /// Aes128Sha256RsaOaep.
    Aes128Sha256RsaOaep,

    /// Aes256Sha256RsaPss.
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    /// Returns the policy URI as transmitted during endpoint selection.
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            Self::Basic128Rsa15 => "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15",
            Self::Basic256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256",
            Self::Basic256Sha256 => {
                "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256"
            }
            Self::Aes128Sha256RsaOaep => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep"
            }
            Self::Aes256Sha256RsaPss => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss"
            }
        }
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Basic128Rsa15 => write!(f, "Basic128Rsa15"),
            Self::Basic256 => write!(f, "Basic256"),
            Self::Basic256Sha256 => write!(f, "Basic256Sha256"),
            Self::Aes128Sha256RsaOaep => write!(f, "Aes128Sha256RsaOaep"),
            Self::Aes256Sha256RsaPss => write!(f, "Aes256Sha256RsaPss"),
        }
    }
}

// =============================================================================
// SecurityMode
// =============================================================================

/// OPC UA message security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// No message security.
    #[default]
    None,

    /// Messages are signed.
    Sign,

    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Sign => write!(f, "Sign"),
            Self::SignAndEncrypt => write!(f, "SignAndEncrypt"),
        }
    }
}

// =============================================================================
// UserTokenType
// =============================================================================

/// How the client authenticates itself to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserTokenType {
    /// Anonymous access.
    #[default]
    Anonymous,

    /// Username and password.
    UserName {
        /// The user name.
        username: String,
        /// The password.
        password: String,
    },

    /// X.509 certificate, referenced by path.
    Certificate {
        /// Path to the certificate.
        certificate_path: String,
        /// Path to the private key.
        private_key_path: String,
    },
}

// =============================================================================
// SessionSettings
// =============================================================================

/// Settings describing one session to one server.
///
/// The session table hands out an existing session only when the requested
/// settings are structurally equal to the session's settings, so every
/// field participates in `PartialEq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Requested session timeout.
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Timeout for the connect handshake.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Interval of the connection watchdog.
    #[serde(with = "humantime_serde")]
    pub watchdog_interval: Duration,

    /// Security policy to request.
    #[serde(default)]
    pub security_policy: SecurityPolicy,

    /// Message security mode to request.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// User authentication token.
    #[serde(default)]
    pub user_token: UserTokenType,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(1200),
            connect_timeout: Duration::from_secs(2),
            watchdog_interval: Duration::from_secs(5),
            security_policy: SecurityPolicy::None,
            security_mode: SecurityMode::None,
            user_token: UserTokenType::Anonymous,
        }
    }
}

impl SessionSettings {
    /// Creates default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session timeout.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the security policy and mode.
    pub fn with_security(mut self, policy: SecurityPolicy, mode: SecurityMode) -> Self {
        self.security_policy = policy;
        self.security_mode = mode;
        self
    }

    /// Sets the user token.
    pub fn with_user_token(mut self, token: UserTokenType) -> Self {
        self.user_token = token;
        self
    }
}

// =============================================================================
// SubscriptionSettings
// =============================================================================

/// Settings describing one subscription on one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    /// Requested publishing interval.
    #[serde(with = "humantime_serde")]
    pub publishing_interval: Duration,

    /// Requested lifetime count.
    pub lifetime_count: u32,

    /// Requested maximum keep-alive count.
    pub max_keepalive_count: u32,

    /// Maximum notifications per publish (0 = unlimited).
    pub max_notifications_per_publish: u32,

    /// Subscription priority.
    pub priority: u8,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            publishing_interval: Duration::from_millis(500),
            lifetime_count: 1200,
            max_keepalive_count: 5,
            max_notifications_per_publish: 0,
            priority: 0,
        }
    }
}

impl SubscriptionSettings {
    /// Creates default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the publishing interval.
    pub fn with_publishing_interval(mut self, interval: Duration) -> Self {
        self.publishing_interval = interval;
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = SessionSettings::default();
        let b = SessionSettings::default();
        assert_eq!(a, b);

        let c = SessionSettings::default().with_session_timeout(Duration::from_secs(60));
        assert_ne!(a, c);

        let d = SessionSettings::default().with_user_token(UserTokenType::UserName {
            username: "operator".into(),
            password: "secret".into(),
        });
        assert_ne!(a, d);
    }

    #[test]
    fn test_subscription_settings_equality() {
        let a = SubscriptionSettings::default();
        let b = SubscriptionSettings::default()
            .with_publishing_interval(Duration::from_millis(100));
        assert_ne!(a, b);
        assert_eq!(a, SubscriptionSettings::new());
    }

    #[test]
    fn test_security_policy_uri() {
        assert!(SecurityPolicy::Basic256Sha256.uri().ends_with("Basic256Sha256"));
    }

    #[test]
    fn test_serde_round_trip() {
        let settings = SessionSettings::default()
            .with_security(SecurityPolicy::Basic256Sha256, SecurityMode::SignAndEncrypt);
        let json = serde_json::to_string(&settings).unwrap();
        let back: SessionSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}
