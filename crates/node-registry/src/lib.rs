//! # Node Registry
//!
//! Message dispatch and node-lifecycle reconciliation for sensor nodes.
//!
//! Nodes publish on a two-level topic namespace, `<category>/<hardware-address>`:
//!
//! ```text
//! presentation/<mac> ──→ ┐
//!                        ├──→ RegistryService::dispatch ──→ options/<mac>
//! data/<mac> ──────────→ ┘          │
//!                                   ↓
//!            NodeDirectory · TypeRegistry · OptionsStore · TelemetryStore
//! ```
//!
//! ## Node Lifecycle
//!
//! | State     | Directory records | On presentation                         |
//! |-----------|-------------------|-----------------------------------------|
//! | Absent    | 0                 | register node and options, no reply     |
//! | Present   | 1                 | update if diverged, publish options     |
//! | Duplicate | 2+                | integrity warning, nothing else         |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entities, validation, node types, outcomes
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `service/` - `RegistryService` implementing the API
//! - `adapters/` - In-memory repositories and the bus publisher
//!
//! ## Usage
//!
//! ```ignore
//! use node_registry::{in_memory_service, FixedClock, InMemoryNodeStore, MessageDispatchApi, RecordingPublisher};
//!
//! let store = InMemoryNodeStore::with_default_types();
//! let publisher = RecordingPublisher::new();
//! let mut service = in_memory_service(&store, &publisher, &FixedClock::new(0));
//!
//! let outcome = service.dispatch("data/aa:bb:cc:dd:ee:ff", br#"{"temperature":21.5}"#)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{
    default_type_descriptors, in_memory_service, BusOptionsPublisher, FixedClock,
    InMemoryNodeStore, InMemoryRegistryService, MutationCounts, PublishedOptions,
    RecordingPublisher, StoreFaults,
};
pub use domain::entities::{
    InsertResult, LocationId, NewNode, NodeId, NodeRecord, OptionsRecord, TelemetryRecord,
    TypeDescriptor, TypeId,
};
pub use domain::errors::{RegistryError, RepositoryError};
pub use domain::identifier::{is_valid_hardware_address, HardwareAddress};
pub use domain::lifecycle::NodeState;
pub use domain::node_type::{Dht22Options, Dht22Reading, NodeOptions, NodeType, Reading};
pub use domain::outcome::{Discard, DiscardClass, DispatchOutcome};
pub use domain::payloads::{FieldError, OptionsPayload};
pub use domain::topic::Category;
pub use ports::inbound::MessageDispatchApi;
pub use ports::outbound::{
    Clock, NodeDirectory, OptionsPublisher, OptionsStore, SystemClock, TelemetryStore,
    TypeRegistry,
};
pub use service::{RegistryDependencies, RegistryService};
