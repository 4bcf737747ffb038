//! # Sensor Hub Runtime
//!
//! Hosts the node registry behind an MQTT session.
//!
//! ## Modules
//!
//! - `config/` - TOML + environment configuration
//! - `mqtt/` - `rumqttc` source and publisher
//! - `storage/` - repository backends (memory, RocksDB)
//! - `ingest/` - the sequential dispatch loop
//! - `metrics_endpoint/` - Prometheus scrape endpoint (`axum`)
//! - `runtime/` - wiring and shutdown
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logging + metrics)
//! 2. Load configuration (file, then environment), validate
//! 3. Open storage and seed the type registry
//! 4. Create the broker session, subscribe on connect
//! 5. Start the metrics endpoint
//! 6. Run the ingest loop until Ctrl-C
//!
//! ```text
//! broker ──presentation/+, data/+──→ MqttSource ──→ IngestLoop ──→ RegistryService
//!    ↑                                                                  │
//!    └───────────────── options/<address> ── MqttPublisher ←────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod ingest;
pub mod metrics_endpoint;
pub mod mqtt;
pub mod runtime;
pub mod storage;

pub use config::{
    BrokerConfig, ConfigError, HubConfig, MetricsConfig, StorageBackend, StorageConfig,
};
pub use ingest::{IngestLoop, IngestStats};
pub use metrics_endpoint::{metrics_router, serve_metrics};
pub use mqtt::{connect, mqtt_options, MqttPublisher, MqttSource};
pub use runtime::{build_registry, HubRegistry, HubRuntime};
pub use storage::{HubStorage, StorageError};
