//! # Dispatch Outcomes
//!
//! Every inbound message ends in exactly one `DispatchOutcome`. Rejections are
//! ordinary outcomes (`Discarded`) and never stop the dispatcher.

use crate::domain::entities::{NodeId, TypeId};
use crate::domain::node_type::NodeType;
use crate::domain::payloads::FieldError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new node was inserted into the directory.
    Registered {
        node_id: NodeId,
        options_created: bool,
    },
    /// A known node re-presented itself.
    Reconciled {
        node_id: NodeId,
        /// The stored address/type were changed to the declared ones.
        updated: bool,
        options_published: bool,
    },
    /// One telemetry record was appended.
    TelemetryStored { node_id: NodeId, node_type: NodeType },
    /// The message was rejected.
    Discarded(Discard),
}

impl DispatchOutcome {
    #[must_use]
    pub fn discard(&self) -> Option<&Discard> {
        match self {
            DispatchOutcome::Discarded(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_discarded(&self) -> bool {
        matches!(self, DispatchOutcome::Discarded(_))
    }
}

/// Reason a message was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Discard {
    #[error("topic `{topic}` is not <category>/<identifier>")]
    MalformedTopic { topic: String },

    #[error("payload is not a UTF-8 JSON object")]
    MalformedPayload,

    #[error("`{identifier}` is not a valid hardware address")]
    InvalidIdentifier { identifier: String },

    #[error("unknown category `{category}`")]
    UnknownCategory { category: String },

    #[error("{0}")]
    MissingField(FieldError),

    #[error("`{ip}` is not an IP address")]
    InvalidNetworkAddress { ip: String },

    #[error("payload mac `{declared}` does not match topic identifier `{topic}`")]
    IdentifierMismatch { topic: String, declared: String },

    #[error("node type {type_id} is not registered")]
    UnknownType { type_id: TypeId },

    #[error("node insert affected {affected} rows")]
    InsertFailed { affected: u64 },

    #[error("inserted node not found exactly once (found {found})")]
    InsertNotVisible { found: usize },

    #[error("node update affected {affected} rows")]
    UpdateFailed { affected: u64 },

    #[error("{count} nodes share this hardware address")]
    DuplicateNode { count: usize },

    #[error("no node with this hardware address")]
    UnknownNode,

    #[error("node type {type_id} has no telemetry schema")]
    UnsupportedType { type_id: TypeId },
}

impl Discard {
    #[must_use]
    pub fn class(&self) -> DiscardClass {
        match self {
            Discard::MalformedTopic { .. } | Discard::MalformedPayload | Discard::MissingField(_) => {
                DiscardClass::MalformedInput
            }
            Discard::InvalidIdentifier { .. }
            | Discard::InvalidNetworkAddress { .. }
            | Discard::IdentifierMismatch { .. } => DiscardClass::ValidationFailure,
            Discard::DuplicateNode { .. } => DiscardClass::IntegrityAnomaly,
            Discard::InsertFailed { .. }
            | Discard::InsertNotVisible { .. }
            | Discard::UpdateFailed { .. } => DiscardClass::StorageFailure,
            Discard::UnknownCategory { .. }
            | Discard::UnknownType { .. }
            | Discard::UnknownNode
            | Discard::UnsupportedType { .. } => DiscardClass::Unrecognized,
        }
    }
}

impl From<FieldError> for Discard {
    fn from(error: FieldError) -> Self {
        Discard::MissingField(error)
    }
}

/// Coarse grouping of discard reasons, used for log levels and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardClass {
    MalformedInput,
    ValidationFailure,
    IntegrityAnomaly,
    StorageFailure,
    Unrecognized,
}

impl DiscardClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiscardClass::MalformedInput => "malformed_input",
            DiscardClass::ValidationFailure => "validation_failure",
            DiscardClass::IntegrityAnomaly => "integrity_anomaly",
            DiscardClass::StorageFailure => "storage_failure",
            DiscardClass::Unrecognized => "unrecognized",
        }
    }

    /// Logged at `warn` rather than `error`.
    #[must_use]
    pub fn is_warning(self) -> bool {
        matches!(
            self,
            DiscardClass::IntegrityAnomaly | DiscardClass::Unrecognized
        )
    }
}

impl fmt::Display for DiscardClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_classes() {
        assert_eq!(Discard::MalformedPayload.class(), DiscardClass::MalformedInput);
        assert_eq!(
            Discard::DuplicateNode { count: 2 }.class(),
            DiscardClass::IntegrityAnomaly
        );
        assert_eq!(
            Discard::UpdateFailed { affected: 0 }.class(),
            DiscardClass::StorageFailure
        );
        assert!(Discard::UnknownNode.class().is_warning());
        assert!(!Discard::MalformedPayload.class().is_warning());
    }

    #[test]
    fn test_discard_display() {
        let discard = Discard::from(FieldError::Missing("ip"));
        assert_eq!(discard.to_string(), "missing field `ip`");
        assert_eq!(discard.class().to_string(), "malformed_input");
    }
}
