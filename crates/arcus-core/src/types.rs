// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core OPC UA types.
//!
//! This module defines the node addressing model (node ids and server-pinned
//! addresses), the variant value type carried by reads, writes and method
//! arguments, and the small id newtypes used throughout the framework.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::StatusCode;

// =============================================================================
// NodeId
// =============================================================================

/// An OPC UA node identifier.
///
/// # Examples
///
/// ```
/// use arcus_core::types::NodeId;
///
/// let numeric = NodeId::numeric(2, 1001);
/// let string = NodeId::string(2, "Machine.Temperature");
/// assert_eq!(numeric.namespace_index, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node id.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node id.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node id.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node id.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns `true` if the identifier is numeric.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self.identifier, NodeIdentifier::Numeric(_))
    }

    /// Returns `true` if the identifier is a string.
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self.identifier, NodeIdentifier::String(_))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};{}", self.namespace_index, self.identifier)
    }
}

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),

    /// String identifier.
    String(String),

    /// GUID identifier.
    Guid(Uuid),

    /// Opaque byte-string identifier.
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b=<{} bytes>", v.len()),
        }
    }
}

// =============================================================================
// NodeAddress
// =============================================================================

/// A node pinned to the logical server that hosts it.
///
/// Request targets address nodes by server URI rather than by endpoint, so
/// the same request can fan out across several servers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    /// URI of the server hosting the node.
    pub server_uri: String,

    /// The node on that server.
    pub node_id: NodeId,
}

impl NodeAddress {
    /// Creates a new node address.
    pub fn new(server_uri: impl Into<String>, node_id: NodeId) -> Self {
        Self {
            server_uri: server_uri.into(),
            node_id,
        }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.server_uri, self.node_id)
    }
}

// =============================================================================
// AttributeId
// =============================================================================

/// Well-known OPC UA attribute ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeId {
    /// The node id attribute.
    NodeId,

    /// The display name attribute.
    DisplayName,

    /// The description attribute.
    Description,

    /// The value attribute.
    #[default]
    Value,

    /// The data type attribute.
    DataType,
}

impl AttributeId {
    /// Returns the numeric attribute id used on the wire.
    pub const fn numeric(&self) -> u32 {
        match self {
            Self::NodeId => 1,
            Self::DisplayName => 4,
            Self::Description => 5,
            Self::Value => 13,
            Self::DataType => 14,
        }
    }
}

// =============================================================================
// UaValue
// =============================================================================

/// A variant value as carried by reads, writes and method arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UaValue {
    /// Boolean value.
    Boolean(bool),

    /// Signed byte.
    SByte(i8),

    /// Unsigned byte.
    Byte(u8),

    /// 16-bit signed integer.
    Int16(i16),

    /// 16-bit unsigned integer.
    UInt16(u16),

    /// 32-bit signed integer.
    Int32(i32),

    /// 32-bit unsigned integer.
    UInt32(u32),

    /// 64-bit signed integer.
    Int64(i64),

    /// 64-bit unsigned integer.
    UInt64(u64),

    /// 32-bit float.
    Float(f32),

    /// 64-bit double.
    Double(f64),

    /// String value.
    String(String),

    /// Date/time value.
    DateTime(DateTime<Utc>),

    /// GUID value.
    Guid(Uuid),

    /// Byte string.
    ByteString(Vec<u8>),

    /// Array of values.
    Array(Vec<UaValue>),

    /// Null value.
    #[default]
    Null,
}

impl UaValue {
    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to interpret the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            Self::SByte(v) => Some(*v != 0),
            Self::Byte(v) => Some(*v != 0),
            Self::Int16(v) => Some(*v != 0),
            Self::UInt16(v) => Some(*v != 0),
            Self::Int32(v) => Some(*v != 0),
            Self::UInt32(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Attempts to interpret the value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Boolean(v) => Some(i64::from(*v)),
            Self::SByte(v) => Some(*v as i64),
            Self::Byte(v) => Some(*v as i64),
            Self::Int16(v) => Some(*v as i64),
            Self::UInt16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::UInt32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Attempts to interpret the value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::SByte(v) => Some(*v as f64),
            Self::Byte(v) => Some(*v as f64),
            Self::Int16(v) => Some(*v as f64),
            Self::UInt16(v) => Some(*v as f64),
            Self::Int32(v) => Some(*v as f64),
            Self::UInt32(v) => Some(*v as f64),
            Self::Int64(v) => Some(*v as f64),
            Self::UInt64(v) => Some(*v as f64),
            Self::Float(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to borrow the value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for UaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::SByte(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{}", v),
            Self::ByteString(v) => write!(f, "<{} bytes>", v.len()),
            Self::Array(v) => write!(f, "[{} items]", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// DataValue
// =============================================================================

/// A value together with its quality and timestamps, as returned by reads
/// and delivered by data-change notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DataValue {
    /// The value, absent when the status is bad.
    pub value: Option<UaValue>,

    /// Quality of the value.
    pub status: StatusCode,

    /// Timestamp applied by the data source.
    pub source_timestamp: Option<DateTime<Utc>>,

    /// Timestamp applied by the server.
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Creates a good data value with a server timestamp of now.
    pub fn good(value: UaValue) -> Self {
        Self {
            value: Some(value),
            status: StatusCode::GOOD,
            source_timestamp: None,
            server_timestamp: Some(Utc::now()),
        }
    }

    /// Creates a bad data value carrying only a status.
    pub fn bad(status: StatusCode) -> Self {
        Self {
            value: None,
            status,
            source_timestamp: None,
            server_timestamp: Some(Utc::now()),
        }
    }
}

// =============================================================================
// Id newtypes
// =============================================================================

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Creates a new id.
            #[inline]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// Returns the raw id value.
            #[inline]
            pub const fn value(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

id_newtype!(
    /// Stable id assigned by the client to one session, unique for the
    /// process lifetime.
    ClientConnectionId,
    "conn-"
);

id_newtype!(
    /// Caller-supplied opaque id identifying one logical request end-to-end.
    RequestHandle,
    "req-"
);

id_newtype!(
    /// Transport-facing id correlating asynchronous completions.
    TransactionId,
    "txn-"
);

id_newtype!(
    /// Client-assigned handle identifying one subscription.
    ClientSubscriptionHandle,
    "sub-"
);

id_newtype!(
    /// Client-assigned handle identifying one monitored item.
    MonitoredItemId,
    "item-"
);

// =============================================================================
// Mask
// =============================================================================

/// A bitset selecting which targets of a request participate in an
/// invocation.
///
/// # Examples
///
/// ```
/// use arcus_core::types::Mask;
///
/// let mut mask = Mask::new(4);
/// mask.set(0);
/// mask.set(2);
/// assert!(mask.is_set(0));
/// assert!(!mask.is_set(1));
/// assert_eq!(mask.count_set(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Mask {
    bits: Vec<bool>,
}

impl Mask {
    /// Creates a mask of the given size with all bits unset.
    pub fn new(size: usize) -> Self {
        Self {
            bits: vec![false; size],
        }
    }

    /// Creates a mask of the given size with all bits set.
    pub fn all(size: usize) -> Self {
        Self {
            bits: vec![true; size],
        }
    }

    /// Returns the number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the mask has no bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Sets the bit at `index`. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit = true;
        }
    }

    /// Clears the bit at `index`. Out-of-range indices are ignored.
    pub fn unset(&mut self, index: usize) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit = false;
        }
    }

    /// Returns `true` if the bit at `index` is set.
    pub fn is_set(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Returns the number of set bits.
    pub fn count_set(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            write!(f, "{}", if *bit { '1' } else { '0' })?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::numeric(2, 1001).to_string(), "ns=2;i=1001");
        assert_eq!(
            NodeId::string(3, "Pump.Speed").to_string(),
            "ns=3;s=Pump.Speed"
        );
    }

    #[test]
    fn test_node_address() {
        let address = NodeAddress::new("urn:factory:line1", NodeId::numeric(2, 7));
        assert_eq!(address.server_uri, "urn:factory:line1");
        assert_eq!(address.to_string(), "urn:factory:line1#ns=2;i=7");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(UaValue::Int32(42).as_i64(), Some(42));
        assert_eq!(UaValue::Double(2.5).as_f64(), Some(2.5));
        assert_eq!(UaValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(UaValue::String("x".into()).as_str(), Some("x"));
        assert!(UaValue::Null.is_null());
        assert_eq!(UaValue::String("x".into()).as_i64(), None);
    }

    #[test]
    fn test_data_value() {
        let good = DataValue::good(UaValue::Double(21.5));
        assert!(good.status.is_good());
        assert!(good.value.is_some());

        let bad = DataValue::bad(StatusCode::BAD_NODE_ID_UNKNOWN);
        assert!(bad.status.is_bad());
        assert!(bad.value.is_none());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ClientConnectionId::new(3).to_string(), "conn-3");
        assert_eq!(TransactionId::new(17).to_string(), "txn-17");
        assert_eq!(RequestHandle::new(42).value(), 42);
    }

    #[test]
    fn test_mask() {
        let mut mask = Mask::new(3);
        assert_eq!(mask.count_set(), 0);
        mask.set(1);
        mask.set(2);
        mask.unset(2);
        assert!(mask.is_set(1));
        assert!(!mask.is_set(2));
        assert!(!mask.is_set(99));
        assert_eq!(mask.count_set(), 1);

        let all = Mask::all(4);
        assert_eq!(all.count_set(), 4);
        assert_eq!(all.to_string(), "1111");
    }

    #[test]
    fn test_attribute_id_numeric() {
        assert_eq!(AttributeId::Value.numeric(), 13);
        assert_eq!(AttributeId::default(), AttributeId::Value);
    }
}
