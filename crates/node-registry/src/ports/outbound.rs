//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the registry service requires the host to provide.
//!
//! Production: RocksDB repositories and the MQTT publisher in `hub-runtime`.
//! Testing: `adapters::memory`.

use crate::domain::entities::{
    InsertResult, NewNode, NodeId, NodeRecord, OptionsRecord, TelemetryRecord, TypeDescriptor,
    TypeId,
};
use crate::domain::errors::RepositoryError;
use crate::domain::identifier::HardwareAddress;
use crate::domain::node_type::NodeType;
use shared_types::PublishError;
use std::net::IpAddr;

/// Node identity records, keyed by hardware address.
pub trait NodeDirectory: Send + Sync {
    /// All records stored under `address`. More than one is an integrity
    /// anomaly the caller surfaces.
    fn find_by_address(&self, address: &HardwareAddress) -> Result<Vec<NodeRecord>, RepositoryError>;

    /// Insert a new record with an unknown location.
    fn insert(&mut self, node: &NewNode) -> Result<InsertResult, RepositoryError>;

    /// Overwrite type and network address of the records under `address`.
    ///
    /// Returns the number of records changed.
    fn update(
        &mut self,
        address: &HardwareAddress,
        type_id: TypeId,
        network_address: IpAddr,
    ) -> Result<u64, RepositoryError>;
}

/// Known node types. Read-only for the hub.
pub trait TypeRegistry: Send + Sync {
    fn find_by_id(&self, id: TypeId) -> Result<Vec<TypeDescriptor>, RepositoryError>;
}

/// Per-type options records.
pub trait OptionsStore: Send + Sync {
    /// Returns the number of records created.
    fn insert_options(&mut self, record: &OptionsRecord) -> Result<u64, RepositoryError>;

    fn find_options(
        &self,
        node_id: NodeId,
        node_type: NodeType,
    ) -> Result<Vec<OptionsRecord>, RepositoryError>;
}

/// Append-only per-type telemetry.
pub trait TelemetryStore: Send + Sync {
    /// Returns the number of records appended.
    fn append(&mut self, record: &TelemetryRecord) -> Result<u64, RepositoryError>;
}

/// Outbound channel for options payloads.
///
/// Publishing enqueues and returns; it never waits for the broker.
pub trait OptionsPublisher: Send + Sync {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// Ingestion clock (for testability).
pub trait Clock: Send + Sync {
    /// Seconds since the unix epoch.
    fn now(&self) -> u64;
}

impl<T: NodeDirectory + ?Sized> NodeDirectory for Box<T> {
    fn find_by_address(&self, address: &HardwareAddress) -> Result<Vec<NodeRecord>, RepositoryError> {
        (**self).find_by_address(address)
    }

    fn insert(&mut self, node: &NewNode) -> Result<InsertResult, RepositoryError> {
        (**self).insert(node)
    }

    fn update(
        &mut self,
        address: &HardwareAddress,
        type_id: TypeId,
        network_address: IpAddr,
    ) -> Result<u64, RepositoryError> {
        (**self).update(address, type_id, network_address)
    }
}

impl<T: TypeRegistry + ?Sized> TypeRegistry for Box<T> {
    fn find_by_id(&self, id: TypeId) -> Result<Vec<TypeDescriptor>, RepositoryError> {
        (**self).find_by_id(id)
    }
}

impl<T: OptionsStore + ?Sized> OptionsStore for Box<T> {
    fn insert_options(&mut self, record: &OptionsRecord) -> Result<u64, RepositoryError> {
        (**self).insert_options(record)
    }

    fn find_options(
        &self,
        node_id: NodeId,
        node_type: NodeType,
    ) -> Result<Vec<OptionsRecord>, RepositoryError> {
        (**self).find_options(node_id, node_type)
    }
}

impl<T: TelemetryStore + ?Sized> TelemetryStore for Box<T> {
    fn append(&mut self, record: &TelemetryRecord) -> Result<u64, RepositoryError> {
        (**self).append(record)
    }
}

impl<T: OptionsPublisher + ?Sized> OptionsPublisher for Box<T> {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        (**self).publish(topic, payload)
    }
}

/// Default clock using system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
