//! # In-Memory Adapters
//!
//! Volatile implementations of every outbound port. Used by the
//! `--memory-store` runtime mode and by tests, which keep a clone of each
//! handle to inspect what the service did.

use crate::domain::entities::{
    InsertResult, NewNode, NodeId, NodeRecord, OptionsRecord, TelemetryRecord, TypeDescriptor,
    TypeId,
};
use crate::domain::errors::RepositoryError;
use crate::domain::identifier::HardwareAddress;
use crate::domain::node_type::NodeType;
use crate::ports::outbound::{
    Clock, NodeDirectory, OptionsPublisher, OptionsStore, TelemetryStore, TypeRegistry,
};
use crate::service::{RegistryDependencies, RegistryService};
use parking_lot::Mutex;
use shared_types::PublishError;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Failure switches for exercising storage error paths.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreFaults {
    /// Node inserts report zero affected rows.
    pub reject_node_inserts: bool,
    /// Node inserts report success but the record never becomes visible.
    pub hide_inserted_nodes: bool,
    /// Node updates report zero affected rows.
    pub reject_node_updates: bool,
    /// Options inserts report zero affected rows.
    pub reject_options_inserts: bool,
    /// Every call fails with `RepositoryError::Unavailable`.
    pub unavailable: bool,
}

/// Successful writes, per table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MutationCounts {
    pub node_inserts: u64,
    pub node_updates: u64,
    pub options_inserts: u64,
    pub telemetry_appends: u64,
}

impl MutationCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.node_inserts + self.node_updates + self.options_inserts + self.telemetry_appends
    }
}

#[derive(Default)]
struct Tables {
    nodes: Vec<NodeRecord>,
    last_node_id: u64,
    types: Vec<TypeDescriptor>,
    options: Vec<OptionsRecord>,
    telemetry: Vec<TelemetryRecord>,
    faults: StoreFaults,
    mutations: MutationCounts,
}

impl Tables {
    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.faults.unavailable {
            return Err(RepositoryError::Unavailable("in-memory store switched off".into()));
        }
        Ok(())
    }
}

/// Shared in-memory store backing all four storage ports.
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryNodeStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already knows the built-in node types.
    pub fn with_default_types() -> Self {
        let store = Self::new();
        for descriptor in default_type_descriptors() {
            store.add_type(descriptor);
        }
        store
    }

    pub fn add_type(&self, descriptor: TypeDescriptor) {
        self.tables.lock().types.push(descriptor);
    }

    /// Insert a record as-is, bypassing the uniqueness check.
    ///
    /// Does not count as a mutation.
    pub fn seed_node(&self, record: NodeRecord) {
        let mut tables = self.tables.lock();
        tables.last_node_id = tables.last_node_id.max(record.id.0);
        tables.nodes.push(record);
    }

    /// Insert an options record as-is. Does not count as a mutation.
    pub fn seed_options(&self, record: OptionsRecord) {
        self.tables.lock().options.push(record);
    }

    pub fn set_faults(&self, faults: StoreFaults) {
        self.tables.lock().faults = faults;
    }

    #[must_use]
    pub fn nodes(&self) -> Vec<NodeRecord> {
        self.tables.lock().nodes.clone()
    }

    #[must_use]
    pub fn options_records(&self) -> Vec<OptionsRecord> {
        self.tables.lock().options.clone()
    }

    #[must_use]
    pub fn telemetry_records(&self) -> Vec<TelemetryRecord> {
        self.tables.lock().telemetry.clone()
    }

    #[must_use]
    pub fn mutations(&self) -> MutationCounts {
        self.tables.lock().mutations
    }
}

/// Node types every fresh store knows about.
#[must_use]
pub fn default_type_descriptors() -> Vec<TypeDescriptor> {
    NodeType::ALL
        .iter()
        .map(|node_type| match node_type {
            NodeType::Dht22 => TypeDescriptor::new(node_type.id(), "DHT22 temperature/humidity", 0),
        })
        .collect()
}

impl NodeDirectory for InMemoryNodeStore {
    fn find_by_address(&self, address: &HardwareAddress) -> Result<Vec<NodeRecord>, RepositoryError> {
        let tables = self.tables.lock();
        tables.check_available()?;
        Ok(tables
            .nodes
            .iter()
            .filter(|n| &n.hardware_address == address)
            .cloned()
            .collect())
    }

    fn insert(&mut self, node: &NewNode) -> Result<InsertResult, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_available()?;

        let exists = tables
            .nodes
            .iter()
            .any(|n| n.hardware_address == node.hardware_address);
        if tables.faults.reject_node_inserts || exists {
            return Ok(InsertResult::rejected());
        }

        tables.last_node_id += 1;
        let id = NodeId(tables.last_node_id);
        if !tables.faults.hide_inserted_nodes {
            tables.nodes.push(node.clone().into_record(id));
        }
        tables.mutations.node_inserts += 1;
        Ok(InsertResult::inserted(id))
    }

    fn update(
        &mut self,
        address: &HardwareAddress,
        type_id: TypeId,
        network_address: IpAddr,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_available()?;
        if tables.faults.reject_node_updates {
            return Ok(0);
        }

        let mut affected = 0;
        for node in tables
            .nodes
            .iter_mut()
            .filter(|n| &n.hardware_address == address)
        {
            node.type_id = type_id;
            node.network_address = network_address;
            affected += 1;
        }
        tables.mutations.node_updates += affected;
        Ok(affected)
    }
}

impl TypeRegistry for InMemoryNodeStore {
    fn find_by_id(&self, id: TypeId) -> Result<Vec<TypeDescriptor>, RepositoryError> {
        let tables = self.tables.lock();
        tables.check_available()?;
        Ok(tables.types.iter().filter(|t| t.id == id).cloned().collect())
    }
}

impl OptionsStore for InMemoryNodeStore {
    fn insert_options(&mut self, record: &OptionsRecord) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_available()?;
        if tables.faults.reject_options_inserts {
            return Ok(0);
        }
        tables.options.push(record.clone());
        tables.mutations.options_inserts += 1;
        Ok(1)
    }

    fn find_options(
        &self,
        node_id: NodeId,
        node_type: NodeType,
    ) -> Result<Vec<OptionsRecord>, RepositoryError> {
        let tables = self.tables.lock();
        tables.check_available()?;
        Ok(tables
            .options
            .iter()
            .filter(|o| o.node_id == node_id && o.node_type() == node_type)
            .cloned()
            .collect())
    }
}

impl TelemetryStore for InMemoryNodeStore {
    fn append(&mut self, record: &TelemetryRecord) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock();
        tables.check_available()?;
        tables.telemetry.push(record.clone());
        tables.mutations.telemetry_appends += 1;
        Ok(1)
    }
}

/// A publish captured by `RecordingPublisher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedOptions {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Publisher that records every publish instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<PublishedOptions>>>,
    failure: Arc<Mutex<Option<PublishError>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following publish fail with `error` (or succeed, with `None`).
    pub fn fail_with(&self, error: Option<PublishError>) {
        *self.failure.lock() = error;
    }

    #[must_use]
    pub fn published(&self) -> Vec<PublishedOptions> {
        self.published.lock().clone()
    }
}

impl OptionsPublisher for RecordingPublisher {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        self.published.lock().push(PublishedOptions {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}

/// Clock frozen at a settable instant.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now: Arc<AtomicU64>,
}

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::Relaxed);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

/// Registry service wired entirely to in-memory adapters.
pub type InMemoryRegistryService = RegistryService<
    InMemoryNodeStore,
    InMemoryNodeStore,
    InMemoryNodeStore,
    InMemoryNodeStore,
    RecordingPublisher,
    FixedClock,
>;

/// Build a service whose ports all share `store`, publishing into `publisher`.
pub fn in_memory_service(
    store: &InMemoryNodeStore,
    publisher: &RecordingPublisher,
    clock: &FixedClock,
) -> InMemoryRegistryService {
    RegistryService::new(RegistryDependencies {
        directory: store.clone(),
        types: store.clone(),
        options: store.clone(),
        telemetry: store.clone(),
        publisher: publisher.clone(),
        clock: clock.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node_type::{Dht22Options, NodeOptions};

    fn address() -> HardwareAddress {
        HardwareAddress::parse("aabbccddeeff").unwrap()
    }

    fn new_node() -> NewNode {
        NewNode {
            hardware_address: address(),
            type_id: TypeId(0),
            network_address: "10.0.0.5".parse().unwrap(),
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let mut store = InMemoryNodeStore::new();
        let first = store.insert(&new_node()).unwrap();
        assert_eq!(first, InsertResult::inserted(NodeId(1)));

        let mut other = new_node();
        other.hardware_address = HardwareAddress::parse("001122334455").unwrap();
        assert_eq!(store.insert(&other).unwrap().id, Some(NodeId(2)));
        assert_eq!(store.mutations().node_inserts, 2);
    }

    #[test]
    fn test_insert_rejects_existing_address() {
        let mut store = InMemoryNodeStore::new();
        store.insert(&new_node()).unwrap();
        assert_eq!(store.insert(&new_node()).unwrap(), InsertResult::rejected());
        assert_eq!(store.nodes().len(), 1);
    }

    #[test]
    fn test_seeded_ids_are_not_reused() {
        let mut store = InMemoryNodeStore::new();
        store.seed_node(new_node().into_record(NodeId(7)));

        let mut other = new_node();
        other.hardware_address = HardwareAddress::parse("001122334455").unwrap();
        assert_eq!(store.insert(&other).unwrap().id, Some(NodeId(8)));
    }

    #[test]
    fn test_clones_share_tables() {
        let store = InMemoryNodeStore::with_default_types();
        let mut handle = store.clone();
        handle
            .insert_options(&OptionsRecord {
                node_id: NodeId(1),
                options: NodeOptions::Dht22(Dht22Options {
                    time_between_reads: 30,
                }),
            })
            .unwrap();

        assert_eq!(store.options_records().len(), 1);
        assert_eq!(store.find_by_id(TypeId(0)).unwrap().len(), 1);
    }

    #[test]
    fn test_unavailable_store_faults() {
        let store = InMemoryNodeStore::new();
        store.set_faults(StoreFaults {
            unavailable: true,
            ..StoreFaults::default()
        });
        assert!(matches!(
            store.find_by_address(&address()),
            Err(RepositoryError::Unavailable(_))
        ));
    }

    #[test]
    fn test_recording_publisher_failure_knob() {
        let publisher = RecordingPublisher::new();
        publisher.publish("options/aabbccddeeff", b"{}".to_vec()).unwrap();

        publisher.fail_with(Some(PublishError::Disconnected));
        assert_eq!(
            publisher.publish("options/aabbccddeeff", b"{}".to_vec()),
            Err(PublishError::Disconnected)
        );
        assert_eq!(publisher.published().len(), 1);
    }
}
