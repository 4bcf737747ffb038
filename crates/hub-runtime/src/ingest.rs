//! # Ingest Loop
//!
//! Pulls messages from a `MessageSource` one at a time and hands each to the
//! registry. The next message is not requested until `dispatch` returns.
//!
//! Nothing a single message does stops the loop: discards are counted,
//! collaborator faults are logged and counted, and the loop moves on. It ends
//! when the source is exhausted or shutdown is signalled.

use hub_telemetry::{
    metric_inc, time_histogram, COLLABORATOR_FAULTS, DISPATCH_DURATION, MESSAGES_DISCARDED,
    MESSAGES_RECEIVED, NODES_REGISTERED, NODES_UPDATED, OPTIONS_PUBLISHED, TELEMETRY_STORED,
};
use node_registry::{Category, DispatchOutcome, MessageDispatchApi, RegistryError};
use shared_bus::MessageSource;
use shared_types::{TransportMessage, TOPIC_SEPARATOR};
use tokio::sync::watch;
use tracing::{error, info};

/// Label used for topics outside the subscribed categories.
const OTHER_CATEGORY: &str = "other";

/// Per-loop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub registered: u64,
    pub reconciled: u64,
    pub telemetry_stored: u64,
    pub discarded: u64,
    pub faults: u64,
}

impl IngestStats {
    fn record(&mut self, result: &Result<DispatchOutcome, RegistryError>) {
        match result {
            Ok(DispatchOutcome::Registered { .. }) => self.registered += 1,
            Ok(DispatchOutcome::Reconciled { .. }) => self.reconciled += 1,
            Ok(DispatchOutcome::TelemetryStored { .. }) => self.telemetry_stored += 1,
            Ok(DispatchOutcome::Discarded(_)) => self.discarded += 1,
            Err(_) => self.faults += 1,
        }
    }
}

fn category_label(topic: &str) -> &'static str {
    topic
        .split(TOPIC_SEPARATOR)
        .next()
        .and_then(Category::from_segment)
        .map_or(OTHER_CATEGORY, Category::as_str)
}

fn record_metrics(result: &Result<DispatchOutcome, RegistryError>) {
    match result {
        Ok(DispatchOutcome::Registered { .. }) => metric_inc!(NODES_REGISTERED),
        Ok(DispatchOutcome::Reconciled {
            updated,
            options_published,
            ..
        }) => {
            if *updated {
                metric_inc!(NODES_UPDATED);
            }
            if *options_published {
                metric_inc!(OPTIONS_PUBLISHED);
            }
        }
        Ok(DispatchOutcome::TelemetryStored { node_type, .. }) => {
            metric_inc!(TELEMETRY_STORED, &[node_type.name()]);
        }
        Ok(DispatchOutcome::Discarded(discard)) => {
            metric_inc!(MESSAGES_DISCARDED, &[discard.class().as_str()]);
        }
        Err(_) => metric_inc!(COLLABORATOR_FAULTS),
    }
}

pub struct IngestLoop<S, A> {
    source: S,
    registry: A,
    stats: IngestStats,
}

impl<S, A> IngestLoop<S, A>
where
    S: MessageSource,
    A: MessageDispatchApi,
{
    pub fn new(source: S, registry: A) -> Self {
        Self {
            source,
            registry,
            stats: IngestStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Dispatch one message and record its outcome.
    pub fn process(&mut self, message: &TransportMessage) -> Result<DispatchOutcome, RegistryError> {
        self.stats.received += 1;
        metric_inc!(MESSAGES_RECEIVED, &[category_label(&message.topic)]);

        let result = {
            let _timer = time_histogram!(DISPATCH_DURATION);
            self.registry.dispatch_message(message)
        };

        if let Err(e) = &result {
            error!(topic = %message.topic, message_id = %message.id, error = %e, "[ingest] Dispatch fault, continuing");
        }

        self.stats.record(&result);
        record_metrics(&result);
        result
    }

    /// Run until the source is exhausted.
    pub async fn run_to_end(&mut self) -> IngestStats {
        while let Some(message) = self.source.next_message().await {
            let _ = self.process(&message);
        }
        info!(stats = ?self.stats, "[ingest] Source exhausted");
        self.stats
    }

    /// Run until the source is exhausted or `shutdown` turns true.
    ///
    /// A message already handed to `dispatch` is always finished first.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> IngestStats {
        if *shutdown.borrow() {
            return self.stats;
        }

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(stats = ?self.stats, "[ingest] Shutdown requested");
                        break;
                    }
                }
                message = self.source.next_message() => {
                    match message {
                        Some(message) => {
                            let _ = self.process(&message);
                        }
                        None => {
                            info!(stats = ?self.stats, "[ingest] Source exhausted");
                            break;
                        }
                    }
                }
            }
        }

        self.stats
    }
}
