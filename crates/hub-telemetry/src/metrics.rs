//! Prometheus metrics for the sensor hub.
//!
//! All metrics follow the naming convention: `hub_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Hub metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Inbound messages by topic category (first topic level, as received)
    pub static ref MESSAGES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("hub_messages_received_total", "Inbound messages by category"),
        &["category"]
    ).expect("metric creation failed");

    /// Discarded messages by discard class
    pub static ref MESSAGES_DISCARDED: IntCounterVec = IntCounterVec::new(
        Opts::new("hub_messages_discarded_total", "Discarded messages by class"),
        &["class"]
    ).expect("metric creation failed");

    /// Nodes inserted into the directory
    pub static ref NODES_REGISTERED: IntCounter = IntCounter::new(
        "hub_nodes_registered_total",
        "Nodes registered on first presentation"
    ).expect("metric creation failed");

    /// Nodes whose address or type changed
    pub static ref NODES_UPDATED: IntCounter = IntCounter::new(
        "hub_nodes_updated_total",
        "Nodes updated on re-presentation"
    ).expect("metric creation failed");

    /// Options payloads handed to the transport
    pub static ref OPTIONS_PUBLISHED: IntCounter = IntCounter::new(
        "hub_options_published_total",
        "Options payloads published to nodes"
    ).expect("metric creation failed");

    /// Telemetry records stored by node type
    pub static ref TELEMETRY_STORED: IntCounterVec = IntCounterVec::new(
        Opts::new("hub_telemetry_stored_total", "Telemetry records stored by node type"),
        &["node_type"]
    ).expect("metric creation failed");

    /// Storage or transport faults raised while dispatching
    pub static ref COLLABORATOR_FAULTS: IntCounter = IntCounter::new(
        "hub_collaborator_faults_total",
        "Storage or transport faults while dispatching"
    ).expect("metric creation failed");

    /// Time spent dispatching one message
    pub static ref DISPATCH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "hub_dispatch_duration_seconds",
            "Time spent dispatching one inbound message"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Register all metrics with the hub registry.
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(MESSAGES_DISCARDED.clone()),
        Box::new(NODES_REGISTERED.clone()),
        Box::new(NODES_UPDATED.clone()),
        Box::new(OPTIONS_PUBLISHED.clone()),
        Box::new(TELEMETRY_STORED.clone()),
        Box::new(COLLABORATOR_FAULTS.clone()),
        Box::new(DISPATCH_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_counter_vec_increment() {
        MESSAGES_RECEIVED.with_label_values(&["presentation"]).inc();
        assert!(MESSAGES_RECEIVED.with_label_values(&["presentation"]).get() >= 1);
    }

    #[test]
    fn test_gather_text_contains_metric_names() {
        register_metrics().unwrap();
        MESSAGES_DISCARDED.with_label_values(&["malformed_input"]).inc();
        NODES_REGISTERED.inc();

        let text = gather_text().unwrap();
        assert!(text.contains("hub_messages_discarded_total"));
        assert!(text.contains("class=\"malformed_input\""));
        assert!(text.contains("hub_nodes_registered_total"));
    }

    #[test]
    fn test_histogram_timer() {
        let before = DISPATCH_DURATION.get_sample_count();
        {
            let _timer = time_histogram!(DISPATCH_DURATION);
        }
        assert!(DISPATCH_DURATION.get_sample_count() > before);
    }
}
