//! # Node Lifecycle
//!
//! A node's state is derived from the directory on every presentation;
//! nothing is cached between messages.

use crate::domain::entities::NodeRecord;

/// Directory state of one hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// No record yet: the node gets registered.
    Absent,
    /// Exactly one record: the node gets reconciled.
    Present(NodeRecord),
    /// More than one record. Surfaced, never resolved.
    Duplicate(usize),
}

impl NodeState {
    #[must_use]
    pub fn from_records(mut records: Vec<NodeRecord>) -> Self {
        match records.len() {
            0 => NodeState::Absent,
            1 => records
                .pop()
                .map_or(NodeState::Absent, NodeState::Present),
            n => NodeState::Duplicate(n),
        }
    }
}
