//! # Hub Configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment,
//! then validated. Every section has defaults, so an empty file (or no file)
//! yields a hub talking to a local broker with in-memory storage.
//!
//! ```toml
//! [broker]
//! host = "broker.local"
//! port = 1883
//! username = "hub"
//! password = "secret"
//! client_id = "mqtt_manager"
//! keep_alive_secs = 60
//!
//! [storage]
//! backend = "rocksdb"
//! path = "/var/lib/sensor-hub"
//!
//! [[node_types]]
//! id = 0
//! description = "DHT22 temperature/humidity"
//! category_id = 0
//!
//! [subscriptions]
//! categories = ["presentation", "data"]
//!
//! [metrics]
//! enabled = true
//! listen = "127.0.0.1:9100"
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `HUB_BROKER_HOST` | `broker.host` |
//! | `HUB_BROKER_PORT` | `broker.port` |
//! | `HUB_BROKER_USERNAME` | `broker.username` |
//! | `HUB_BROKER_PASSWORD` | `broker.password` |
//! | `HUB_STORAGE_PATH` | `storage.path` |
//! | `HUB_METRICS_ADDR` | `metrics.listen` |
//!
//! The broker may be anonymous. Username and password are either both set
//! or both absent.

use node_registry::{default_type_descriptors, Category, TypeDescriptor, TypeId};
use serde::Deserialize;
use shared_types::category_subscription;
use std::collections::HashSet;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BROKER_HOST: &str = "localhost";
pub const DEFAULT_BROKER_PORT: u16 = 1883;
pub const DEFAULT_CLIENT_ID: &str = "mqtt_manager";
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
pub const DEFAULT_METRICS_PORT: u16 = 9100;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub keep_alive_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BROKER_HOST.to_string(),
            port: DEFAULT_BROKER_PORT,
            username: None,
            password: None,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
        }
    }
}

impl BrokerConfig {
    /// Username and password, when both are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Rocksdb,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: Option<PathBuf>,
}

/// One `[[node_types]]` entry, seeded into the type registry at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeTypeConfig {
    pub id: i64,
    pub description: String,
    #[serde(default)]
    pub category_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub categories: Vec<String>,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            categories: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
        }
    }
}

/// Prometheus scrape endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_METRICS_PORT)),
        }
    }
}

/// Full hub configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub broker: BrokerConfig,
    pub storage: StorageConfig,
    pub node_types: Vec<NodeTypeConfig>,
    pub subscriptions: SubscriptionConfig,
    pub metrics: MetricsConfig,
}

impl HubConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `HUB_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HUB_BROKER_HOST") {
            self.broker.host = host;
        }
        if let Some(port) = lookup("HUB_BROKER_PORT") {
            self.broker.port = port.parse().map_err(|_| ConfigError::Invalid {
                field: "broker.port",
                reason: format!("not a port number: {port}"),
            })?;
        }
        if let Some(username) = lookup("HUB_BROKER_USERNAME") {
            self.broker.username = Some(username);
        }
        if let Some(password) = lookup("HUB_BROKER_PASSWORD") {
            self.broker.password = Some(password);
        }
        if let Some(path) = lookup("HUB_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup("HUB_METRICS_ADDR") {
            self.metrics.listen = addr.parse().map_err(|_| ConfigError::Invalid {
                field: "metrics.listen",
                reason: format!("not a socket address: {addr}"),
            })?;
        }
        Ok(())
    }

    /// Reject configurations the hub cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.host.trim().is_empty() {
            return Err(ConfigError::MissingField("broker.host"));
        }
        if self.broker.port == 0 {
            return Err(ConfigError::Invalid {
                field: "broker.port",
                reason: "port 0 is not connectable".to_string(),
            });
        }
        if self.broker.client_id.is_empty() {
            return Err(ConfigError::MissingField("broker.client_id"));
        }
        // Anonymous brokers are allowed; half a credential pair is not.
        match (&self.broker.username, &self.broker.password) {
            (Some(_), None) => return Err(ConfigError::MissingField("broker.password")),
            (None, Some(_)) => return Err(ConfigError::MissingField("broker.username")),
            _ => {}
        }

        if self.storage.backend == StorageBackend::Rocksdb && self.storage.path.is_none() {
            return Err(ConfigError::MissingField("storage.path"));
        }

        let mut seen = HashSet::new();
        for node_type in &self.node_types {
            if !seen.insert(node_type.id) {
                return Err(ConfigError::Invalid {
                    field: "node_types.id",
                    reason: format!("duplicate node type id {}", node_type.id),
                });
            }
        }

        if self.subscriptions.categories.is_empty() {
            return Err(ConfigError::MissingField("subscriptions.categories"));
        }
        for category in &self.subscriptions.categories {
            if Category::from_segment(category).is_none() {
                return Err(ConfigError::Invalid {
                    field: "subscriptions.categories",
                    reason: format!("unknown category {category}"),
                });
            }
        }

        Ok(())
    }

    /// Type registry contents. Falls back to the built-in types when the
    /// file declares none.
    #[must_use]
    pub fn type_descriptors(&self) -> Vec<TypeDescriptor> {
        if self.node_types.is_empty() {
            return default_type_descriptors();
        }
        self.node_types
            .iter()
            .map(|t| TypeDescriptor::new(TypeId(t.id), t.description.clone(), t.category_id))
            .collect()
    }

    /// Broker subscription filters, one `<category>/+` per category.
    #[must_use]
    pub fn subscription_filters(&self) -> Vec<String> {
        self.subscriptions
            .categories
            .iter()
            .map(|c| category_subscription(c))
            .collect()
    }
}
