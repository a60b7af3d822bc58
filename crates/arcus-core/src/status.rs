// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA status codes.
//!
//! Per-target operation outcomes are reported as raw OPC UA status codes.
//! The two top bits of a code carry its severity: `10` is bad, `01` is
//! uncertain, `00` is good.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// StatusCode
// =============================================================================

/// An OPC UA status code.
///
/// # Examples
///
/// ```
/// use arcus_core::status::StatusCode;
///
/// assert!(StatusCode::GOOD.is_good());
/// assert!(StatusCode::BAD_TIMEOUT.is_bad());
/// assert!(StatusCode::UNCERTAIN_INITIAL_VALUE.is_uncertain());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// The operation succeeded.
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);

    /// The request was accepted and completes asynchronously.
    pub const GOOD_COMPLETES_ASYNCHRONOUSLY: StatusCode = StatusCode(0x002E_0000);

    /// The value is an initial value that has not yet been updated.
    pub const UNCERTAIN_INITIAL_VALUE: StatusCode = StatusCode(0x4092_0000);

    /// An unexpected error occurred.
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x8001_0000);

    /// The operation timed out.
    pub const BAD_TIMEOUT: StatusCode = StatusCode(0x800A_0000);

    /// The server is not connected.
    pub const BAD_SERVER_NOT_CONNECTED: StatusCode = StatusCode(0x800D_0000);

    /// There was nothing to do because the request specified no work.
    pub const BAD_NOTHING_TO_DO: StatusCode = StatusCode(0x800F_0000);

    /// The requested service is not supported.
    pub const BAD_SERVICE_UNSUPPORTED: StatusCode = StatusCode(0x800B_0000);

    /// The node id refers to a node that does not exist.
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);

    /// The attribute is not supported for the specified node.
    pub const BAD_ATTRIBUTE_ID_INVALID: StatusCode = StatusCode(0x8035_0000);

    /// The subscription id is not valid.
    pub const BAD_SUBSCRIPTION_ID_INVALID: StatusCode = StatusCode(0x8028_0000);

    /// The session is not activated or has been closed.
    pub const BAD_SESSION_CLOSED: StatusCode = StatusCode(0x8026_0000);

    /// The connection to the server was lost.
    pub const BAD_CONNECTION_CLOSED: StatusCode = StatusCode(0x80AE_0000);

    /// Creates a status code from its raw value.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw code value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the severity is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Returns `true` if the severity is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Returns `true` if the severity is uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & 0x4000_0000 != 0 && self.0 & 0x8000_0000 == 0
    }

    /// Returns the symbolic name for well-known codes.
    pub const fn name(&self) -> Option<&'static str> {
        match self.0 {
            0x0000_0000 => Some("Good"),
            0x002E_0000 => Some("GoodCompletesAsynchronously"),
            0x4092_0000 => Some("UncertainInitialValue"),
            0x8001_0000 => Some("BadUnexpectedError"),
            0x800A_0000 => Some("BadTimeout"),
            0x800B_0000 => Some("BadServiceUnsupported"),
            0x800D_0000 => Some("BadServerNotConnected"),
            0x800F_0000 => Some("BadNothingToDo"),
            0x8026_0000 => Some("BadSessionClosed"),
            0x8028_0000 => Some("BadSubscriptionIdInvalid"),
            0x8034_0000 => Some("BadNodeIdUnknown"),
            0x8035_0000 => Some("BadAttributeIdInvalid"),
            0x80AE_0000 => Some("BadConnectionClosed"),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl From<u32> for StatusCode {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        assert!(StatusCode::GOOD.is_good());
        assert!(StatusCode::GOOD_COMPLETES_ASYNCHRONOUSLY.is_good());
        assert!(!StatusCode::GOOD.is_bad());

        assert!(StatusCode::BAD_TIMEOUT.is_bad());
        assert!(!StatusCode::BAD_TIMEOUT.is_good());
        assert!(!StatusCode::BAD_TIMEOUT.is_uncertain());

        assert!(StatusCode::UNCERTAIN_INITIAL_VALUE.is_uncertain());
        assert!(!StatusCode::UNCERTAIN_INITIAL_VALUE.is_good());
        assert!(!StatusCode::UNCERTAIN_INITIAL_VALUE.is_bad());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::GOOD.to_string(), "Good");
        assert_eq!(
            StatusCode::BAD_SERVER_NOT_CONNECTED.to_string(),
            "BadServerNotConnected"
        );
        assert_eq!(StatusCode::new(0x8123_0000).to_string(), "0x81230000");
    }

    #[test]
    fn test_default_is_good() {
        assert_eq!(StatusCode::default(), StatusCode::GOOD);
    }
}
