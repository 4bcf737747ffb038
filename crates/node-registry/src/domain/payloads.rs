//! # Message Payloads
//!
//! Inbound payloads are UTF-8 JSON objects. Field access goes through the
//! `require_*` helpers so a missing field and a mistyped field are reported
//! the same way everywhere.

use crate::domain::entities::TypeId;
use crate::domain::identifier::HardwareAddress;
use crate::domain::node_type::NodeOptions;
use crate::domain::outcome::Discard;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use thiserror::Error;

/// A decoded inbound payload.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub const IP_FIELD: &str = "ip";
pub const MAC_FIELD: &str = "mac";
pub const NODE_TYPE_FIELD: &str = "nodeType";

/// Why a payload field could not be read.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("field `{0}` has the wrong type")]
    Invalid(&'static str),
}

impl FieldError {
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::Missing(f) | FieldError::Invalid(f) => f,
        }
    }
}

/// Decode a raw payload into a JSON object.
///
/// Returns `None` for invalid UTF-8, invalid JSON, or any JSON value that
/// is not an object.
#[must_use]
pub fn decode_document(payload: &[u8]) -> Option<Document> {
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn require<'a>(doc: &'a Document, field: &'static str) -> Result<&'a serde_json::Value, FieldError> {
    match doc.get(field) {
        None | Some(serde_json::Value::Null) => Err(FieldError::Missing(field)),
        Some(value) => Ok(value),
    }
}

pub fn require_str<'a>(doc: &'a Document, field: &'static str) -> Result<&'a str, FieldError> {
    require(doc, field)?
        .as_str()
        .ok_or(FieldError::Invalid(field))
}

/// Integers only; `1.0` is accepted, `1.5` is not.
pub fn require_i64(doc: &Document, field: &'static str) -> Result<i64, FieldError> {
    let value = require(doc, field)?;
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(FieldError::Invalid(field)),
    }
}

pub fn require_u32(doc: &Document, field: &'static str) -> Result<u32, FieldError> {
    let n = require_i64(doc, field)?;
    u32::try_from(n).map_err(|_| FieldError::Invalid(field))
}

pub fn require_f64(doc: &Document, field: &'static str) -> Result<f64, FieldError> {
    require(doc, field)?
        .as_f64()
        .ok_or(FieldError::Invalid(field))
}

/// The identity fields every presentation carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub network_address: IpAddr,
    pub node_type: TypeId,
}

impl Presentation {
    /// Read the identity of a node presenting on `presentation/<topic_address>`.
    ///
    /// Checked in order, first failure wins:
    ///
    /// 1. `ip` present and an IPv4 or IPv6 literal
    /// 2. `mac` present and spelled exactly as in the topic
    /// 3. `nodeType` present and integral
    pub fn from_document(doc: &Document, topic_address: &HardwareAddress) -> Result<Self, Discard> {
        let ip = require_str(doc, IP_FIELD)?;
        let network_address = ip.parse().map_err(|_| Discard::InvalidNetworkAddress {
            ip: ip.to_string(),
        })?;

        let mac = require_str(doc, MAC_FIELD)?;
        if mac != topic_address.as_str() {
            return Err(Discard::IdentifierMismatch {
                topic: topic_address.to_string(),
                declared: mac.to_string(),
            });
        }

        Ok(Self {
            network_address,
            node_type: TypeId(require_i64(doc, NODE_TYPE_FIELD)?),
        })
    }
}

/// Wire form of the options pushed to a node on `options/<address>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionsPayload {
    Dht22 {
        #[serde(rename = "timeToWait")]
        time_to_wait: u32,
    },
}

impl OptionsPayload {
    #[must_use]
    pub fn from_options(options: &NodeOptions) -> Self {
        match options {
            NodeOptions::Dht22(o) => OptionsPayload::Dht22 {
                time_to_wait: o.time_between_reads,
            },
        }
    }

    /// Serialize to the bytes published to the node.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
