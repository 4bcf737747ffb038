//! # Adapters
//!
//! - `memory`: volatile repositories, recording publisher and fixed clock
//! - `bus`: options publishing over a `shared_bus::MessagePublisher`

pub mod bus;
pub mod memory;

pub use bus::BusOptionsPublisher;
pub use memory::{
    default_type_descriptors, in_memory_service, FixedClock, InMemoryNodeStore,
    InMemoryRegistryService, MutationCounts, PublishedOptions, RecordingPublisher, StoreFaults,
};
