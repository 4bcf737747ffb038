//! # Node Types
//!
//! The closed set of node types the hub understands. Each type owns its
//! options schema and its telemetry reading schema; adding a type means a new
//! variant here and a branch in each match below.

use crate::domain::entities::TypeId;
use crate::domain::payloads::{require_f64, require_i64, require_u32, Document, FieldError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation field carrying the read interval of a DHT22 node.
pub const DHT22_TIME_TO_WAIT_FIELD: &str = "sketchTimeToWait";

/// Data fields of a DHT22 node.
pub const DHT22_TEMPERATURE_FIELD: &str = "temperature";
pub const DHT22_HUMIDITY_FIELD: &str = "humidity";
pub const DHT22_RSSI_FIELD: &str = "rssi";

/// A node type with a known options and telemetry schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Temperature/humidity sensor (type id 0).
    Dht22,
}

impl NodeType {
    pub const ALL: [NodeType; 1] = [NodeType::Dht22];

    /// Map a stored/declared type id onto a supported type.
    #[must_use]
    pub fn from_id(id: TypeId) -> Option<Self> {
        match id.0 {
            0 => Some(NodeType::Dht22),
            _ => None,
        }
    }

    #[must_use]
    pub fn id(self) -> TypeId {
        match self {
            NodeType::Dht22 => TypeId(0),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Dht22 => "dht22",
        }
    }

    /// Build the initial options of a freshly registered node from its
    /// presentation payload.
    pub fn options_from_presentation(self, payload: &Document) -> Result<NodeOptions, FieldError> {
        match self {
            NodeType::Dht22 => Ok(NodeOptions::Dht22(Dht22Options {
                time_between_reads: require_u32(payload, DHT22_TIME_TO_WAIT_FIELD)?,
            })),
        }
    }

    /// Extract one telemetry reading from a data payload.
    pub fn reading_from_payload(self, payload: &Document) -> Result<Reading, FieldError> {
        match self {
            NodeType::Dht22 => Ok(Reading::Dht22(Dht22Reading {
                temperature: require_f64(payload, DHT22_TEMPERATURE_FIELD)?,
                humidity: require_f64(payload, DHT22_HUMIDITY_FIELD)?,
                rssi: require_i64(payload, DHT22_RSSI_FIELD)?,
            })),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options of a DHT22 node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dht22Options {
    /// Seconds the node sleeps between two reads.
    pub time_between_reads: u32,
}

/// Per-type node options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeOptions {
    Dht22(Dht22Options),
}

impl NodeOptions {
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeOptions::Dht22(_) => NodeType::Dht22,
        }
    }
}

/// One DHT22 measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dht22Reading {
    pub temperature: f64,
    pub humidity: f64,
    /// Received signal strength reported by the node, in dBm.
    pub rssi: i64,
}

/// Per-type telemetry reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reading {
    Dht22(Dht22Reading),
}

impl Reading {
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Reading::Dht22(_) => NodeType::Dht22,
        }
    }
}
