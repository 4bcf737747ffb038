//! # Storage Backends
//!
//! Opens the repositories the registry runs on and seeds the type registry
//! from configuration.
//!
//! - `memory` (default): `InMemoryNodeStore`, lost on restart
//! - `rocksdb` (feature `rocksdb`): `rocksdb_store::RocksDbNodeStore`

#[cfg(feature = "rocksdb")]
pub mod rocksdb_store;

use crate::config::{StorageBackend, StorageConfig};
use node_registry::{
    InMemoryNodeStore, NodeDirectory, OptionsStore, RepositoryError, TelemetryStore,
    TypeDescriptor, TypeRegistry,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("RocksDB backend not compiled in (rebuild with `--features rocksdb`)")]
    BackendUnavailable,

    #[error("Storage backend `rocksdb` requires `storage.path`")]
    MissingPath,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The four repositories the registry depends on, boxed so the runtime can
/// pick a backend at startup.
pub struct HubStorage {
    pub directory: Box<dyn NodeDirectory>,
    pub types: Box<dyn TypeRegistry>,
    pub options: Box<dyn OptionsStore>,
    pub telemetry: Box<dyn TelemetryStore>,
}

impl HubStorage {
    /// Open the configured backend and seed it with `node_types`.
    pub fn open(config: &StorageConfig, node_types: &[TypeDescriptor]) -> Result<Self, StorageError> {
        match config.backend {
            StorageBackend::Memory => Ok(Self::in_memory(node_types).0),
            StorageBackend::Rocksdb => {
                let path = config.path.as_ref().ok_or(StorageError::MissingPath)?;
                Self::open_rocksdb(path, node_types)
            }
        }
    }

    /// Volatile storage. The returned store handle shares state with the
    /// repositories, for inspection.
    #[must_use]
    pub fn in_memory(node_types: &[TypeDescriptor]) -> (Self, InMemoryNodeStore) {
        let store = InMemoryNodeStore::new();
        for descriptor in node_types {
            store.add_type(descriptor.clone());
        }
        info!(types = node_types.len(), "[storage] Using in-memory storage");
        (Self::from_shared(store.clone()), store)
    }

    #[cfg(feature = "rocksdb")]
    fn open_rocksdb(path: &std::path::Path, node_types: &[TypeDescriptor]) -> Result<Self, StorageError> {
        let store = rocksdb_store::RocksDbNodeStore::open(rocksdb_store::RocksDbConfig::new(path))?;
        for descriptor in node_types {
            store.put_type(descriptor)?;
        }
        info!(path = %path.display(), types = node_types.len(), "[storage] Opened RocksDB storage");
        Ok(Self::from_shared(store))
    }

    #[cfg(not(feature = "rocksdb"))]
    fn open_rocksdb(_path: &std::path::Path, _node_types: &[TypeDescriptor]) -> Result<Self, StorageError> {
        Err(StorageError::BackendUnavailable)
    }

    /// Use one cloneable handle for all four repositories.
    pub fn from_shared<S>(store: S) -> Self
    where
        S: NodeDirectory + TypeRegistry + OptionsStore + TelemetryStore + Clone + 'static,
    {
        Self {
            directory: Box::new(store.clone()),
            types: Box::new(store.clone()),
            options: Box::new(store.clone()),
            telemetry: Box::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_registry::{default_type_descriptors, TypeId};

    #[test]
    fn test_memory_backend_is_seeded() {
        let config = StorageConfig::default();
        let storage = HubStorage::open(&config, &default_type_descriptors()).unwrap();

        assert_eq!(storage.types.find_by_id(TypeId(0)).unwrap().len(), 1);
        assert!(storage.types.find_by_id(TypeId(1)).unwrap().is_empty());
    }

    #[test]
    fn test_in_memory_handle_shares_state() {
        let types = vec![
            TypeDescriptor::new(TypeId(0), "DHT22", 0),
            TypeDescriptor::new(TypeId(5), "Relay", 1),
        ];
        let (storage, store) = HubStorage::in_memory(&types);

        assert_eq!(storage.types.find_by_id(TypeId(5)).unwrap().len(), 1);
        store.add_type(TypeDescriptor::new(TypeId(9), "Soil", 2));
        assert_eq!(storage.types.find_by_id(TypeId(9)).unwrap().len(), 1);
    }

    #[test]
    fn test_rocksdb_without_path() {
        let config = StorageConfig {
            backend: StorageBackend::Rocksdb,
            path: None,
        };
        assert!(matches!(
            HubStorage::open(&config, &[]),
            Err(StorageError::MissingPath)
        ));
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn test_rocksdb_not_compiled_in() {
        let config = StorageConfig {
            backend: StorageBackend::Rocksdb,
            path: Some("/tmp/sensor-hub".into()),
        };
        assert!(matches!(
            HubStorage::open(&config, &[]),
            Err(StorageError::BackendUnavailable)
        ));
    }
}
