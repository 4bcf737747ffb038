//! # Hub Telemetry
//!
//! Logging and metrics for the sensor hub.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` fmt output, pretty or JSON, plus an
//!   optional append-mode log file
//! - **Metrics**: Prometheus counters in a hub-local registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hub_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `sensor-hub` | Service name in logs |
//! | `HUB_LOG_LEVEL` | `info` | Log level filter |
//! | `HUB_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `HUB_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `HUB_LOG_FILE` | unset | Also append plain log lines to this file |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, file_layer, init_logging, FileLayer};
pub use metrics::{
    gather_text, register_metrics, HistogramTimer, COLLABORATOR_FAULTS, DISPATCH_DURATION,
    MESSAGES_DISCARDED, MESSAGES_RECEIVED, NODES_REGISTERED, NODES_UPDATED, OPTIONS_PUBLISHED,
    TELEMETRY_STORED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to open log file {path}: {error}")]
    LogFile { path: String, error: String },

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics and install the global log subscriber.
///
/// The returned guard logs the shutdown when dropped.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
