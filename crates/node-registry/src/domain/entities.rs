//! # Domain Entities
//!
//! Records held by the node directory, the type registry and the per-type
//! options/telemetry stores.

use crate::domain::identifier::HardwareAddress;
use crate::domain::node_type::{NodeOptions, NodeType, Reading};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Identifier assigned by the node directory on insert. Immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node type identifier, as declared by nodes in `nodeType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub i64);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of a node. Assigned by operators, never by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub u64);

impl LocationId {
    /// Sentinel for nodes that have not been placed yet.
    pub const UNKNOWN: LocationId = LocationId(0);

    #[must_use]
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

/// A node identity record.
///
/// At most one record exists per hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub hardware_address: HardwareAddress,
    pub network_address: IpAddr,
    pub type_id: TypeId,
    pub location_id: LocationId,
}

impl NodeRecord {
    /// True when the stored network address and type equal the declared ones.
    #[must_use]
    pub fn matches_declaration(&self, network_address: IpAddr, type_id: TypeId) -> bool {
        self.network_address == network_address && self.type_id == type_id
    }
}

/// Values for a directory insert. The location always starts as `UNKNOWN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub hardware_address: HardwareAddress,
    pub type_id: TypeId,
    pub network_address: IpAddr,
}

impl NewNode {
    /// The record the directory creates for this insert.
    #[must_use]
    pub fn into_record(self, id: NodeId) -> NodeRecord {
        NodeRecord {
            id,
            hardware_address: self.hardware_address,
            network_address: self.network_address,
            type_id: self.type_id,
            location_id: LocationId::UNKNOWN,
        }
    }
}

/// A known node type. Read-only for the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub description: String,
    pub category_id: u32,
}

impl TypeDescriptor {
    pub fn new(id: TypeId, description: impl Into<String>, category_id: u32) -> Self {
        Self {
            id,
            description: description.into(),
            category_id,
        }
    }
}

/// Per-node settings, created once at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsRecord {
    pub node_id: NodeId,
    pub options: NodeOptions,
}

impl OptionsRecord {
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.options.node_type()
    }
}

/// One accepted telemetry message. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Ingestion time, unix seconds. Not the node's clock.
    pub timestamp: u64,
    pub node_id: NodeId,
    pub reading: Reading,
}

/// Result of a directory insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertResult {
    /// Rows created. Anything but 1 is an insert failure.
    pub affected: u64,
    /// Identifier assigned on success.
    pub id: Option<NodeId>,
}

impl InsertResult {
    #[must_use]
    pub fn inserted(id: NodeId) -> Self {
        Self {
            affected: 1,
            id: Some(id),
        }
    }

    #[must_use]
    pub fn rejected() -> Self {
        Self {
            affected: 0,
            id: None,
        }
    }
}
