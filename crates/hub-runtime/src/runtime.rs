//! # Hub Runtime
//!
//! Wires storage and a transport into a registry and runs the ingest loop
//! until shutdown.

use crate::ingest::{IngestLoop, IngestStats};
use crate::storage::HubStorage;
use node_registry::{
    BusOptionsPublisher, NodeDirectory, OptionsStore, RegistryDependencies, RegistryService,
    SystemClock, TelemetryStore, TypeRegistry,
};
use shared_bus::{MessagePublisher, MessageSource};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// The registry as the runtime assembles it: boxed repositories, options
/// published over whichever transport is connected.
pub type HubRegistry = RegistryService<
    Box<dyn NodeDirectory>,
    Box<dyn TypeRegistry>,
    Box<dyn OptionsStore>,
    Box<dyn TelemetryStore>,
    BusOptionsPublisher<Arc<dyn MessagePublisher>>,
    SystemClock,
>;

#[must_use]
pub fn build_registry(storage: HubStorage, transport: Arc<dyn MessagePublisher>) -> HubRegistry {
    RegistryService::new(RegistryDependencies {
        directory: storage.directory,
        types: storage.types,
        options: storage.options,
        telemetry: storage.telemetry,
        publisher: BusOptionsPublisher::new(transport),
        clock: SystemClock,
    })
}

pub struct HubRuntime {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl HubRuntime {
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Handle for signalling shutdown from another task.
    #[must_use]
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Receiver for tasks that must stop with the ingest loop.
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Feed `source` into `registry` until shutdown or source exhaustion.
    pub async fn run<S: MessageSource>(&self, source: S, registry: HubRegistry) -> IngestStats {
        info!("===========================================");
        info!("  Sensor Hub v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let mut ingest = IngestLoop::new(source, registry);
        let stats = ingest.run(self.shutdown_rx.clone()).await;

        info!(
            received = stats.received,
            registered = stats.registered,
            reconciled = stats.reconciled,
            telemetry_stored = stats.telemetry_stored,
            discarded = stats.discarded,
            faults = stats.faults,
            "Ingest loop stopped"
        );
        stats
    }
}

impl Default for HubRuntime {
    fn default() -> Self {
        Self::new()
    }
}
