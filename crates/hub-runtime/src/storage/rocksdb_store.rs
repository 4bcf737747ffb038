//! # RocksDB Node Store
//!
//! Persistent implementation of the four registry repositories.
//!
//! ## Column Families
//!
//! - `nodes` - `<hardware address> 0x00 <node id BE>` → `NodeRecord`
//! - `types` - `<type id BE>` → `TypeDescriptor`
//! - `options` - `<node id BE><node type name>` → `OptionsRecord`
//! - `telemetry` - `<node id BE><timestamp BE><sequence BE>` → `TelemetryRecord`
//! - `meta` - counters (`node_id_seq`, `telemetry_seq`)
//!
//! Values are JSON. Keying nodes by address plus id keeps duplicate rows
//! representable, so an address with several records is reported as such
//! instead of silently collapsing.

use node_registry::{
    HardwareAddress, InsertResult, NewNode, NodeDirectory, NodeId, NodeRecord, NodeType,
    OptionsRecord, OptionsStore, RepositoryError, TelemetryRecord, TelemetryStore,
    TypeDescriptor, TypeId, TypeRegistry,
};
use parking_lot::RwLock;
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, Direction,
    IteratorMode, Options, WriteBatch, WriteOptions, DB,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

pub const CF_NODES: &str = "nodes";
pub const CF_TYPES: &str = "types";
pub const CF_OPTIONS: &str = "options";
pub const CF_TELEMETRY: &str = "telemetry";
pub const CF_META: &str = "meta";

pub const COLUMN_FAMILIES: &[&str] = &[CF_NODES, CF_TYPES, CF_OPTIONS, CF_TELEMETRY, CF_META];

const NODE_ID_SEQ: &[u8] = b"node_id_seq";
const TELEMETRY_SEQ: &[u8] = b"telemetry_seq";
const ADDRESS_TERMINATOR: u8 = 0x00;

#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    pub path: PathBuf,
    /// Block cache size in bytes (default: 32MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// fsync after each write (default: true)
    pub sync_writes: bool,
}

impl RocksDbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 32 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }

    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed node store. Clones share the same database.
#[derive(Clone)]
pub struct RocksDbNodeStore {
    db: Arc<RwLock<DB>>,
    sync_writes: bool,
}

fn io_error(context: &'static str) -> impl FnOnce(rocksdb::Error) -> RepositoryError {
    move |e| RepositoryError::Io(format!("RocksDB {context} failed: {e}"))
}

fn column<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily, RepositoryError> {
    db.cf_handle(name)
        .ok_or_else(|| RepositoryError::Corrupted(format!("missing column family {name}")))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, RepositoryError> {
    serde_json::to_vec(value).map_err(|e| RepositoryError::Corrupted(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RepositoryError> {
    serde_json::from_slice(bytes).map_err(|e| RepositoryError::Corrupted(e.to_string()))
}

fn read_counter(db: &DB, key: &[u8]) -> Result<u64, RepositoryError> {
    let meta = column(db, CF_META)?;
    match db.get_cf(meta, key).map_err(io_error("counter read"))? {
        None => Ok(0),
        Some(bytes) => {
            let raw: [u8; 8] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| RepositoryError::Corrupted("counter is not 8 bytes".to_string()))?;
            Ok(u64::from_be_bytes(raw))
        }
    }
}

fn address_prefix(address: &HardwareAddress) -> Vec<u8> {
    let mut prefix = address.as_str().as_bytes().to_vec();
    prefix.push(ADDRESS_TERMINATOR);
    prefix
}

fn node_key(address: &HardwareAddress, id: NodeId) -> Vec<u8> {
    let mut key = address_prefix(address);
    key.extend_from_slice(&id.0.to_be_bytes());
    key
}

fn options_key(node_id: NodeId, node_type: NodeType) -> Vec<u8> {
    let mut key = node_id.0.to_be_bytes().to_vec();
    key.extend_from_slice(node_type.name().as_bytes());
    key
}

fn prefix_scan(db: &DB, cf: &ColumnFamily, prefix: &[u8]) -> Result<Vec<Box<[u8]>>, RepositoryError> {
    let mut values = Vec::new();
    for item in db.iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward)) {
        let (key, value) = item.map_err(io_error("scan"))?;
        if !key.starts_with(prefix) {
            break;
        }
        values.push(value);
    }
    Ok(values)
}

impl RocksDbNodeStore {
    /// Open or create the database.
    pub fn open(config: RocksDbConfig) -> Result<Self, RepositoryError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, descriptors).map_err(|e| {
            RepositoryError::Unavailable(format!(
                "Failed to open RocksDB at {}: {e}",
                config.path.display()
            ))
        })?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            sync_writes: config.sync_writes,
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    /// Insert or replace a type descriptor.
    pub fn put_type(&self, descriptor: &TypeDescriptor) -> Result<(), RepositoryError> {
        let db = self.db.write();
        let types = column(&db, CF_TYPES)?;
        db.put_cf_opt(
            types,
            descriptor.id.0.to_be_bytes(),
            encode(descriptor)?,
            &self.write_options(),
        )
        .map_err(io_error("type write"))
    }

    /// Every telemetry record of one node, oldest first.
    pub fn telemetry_for(&self, node_id: NodeId) -> Result<Vec<TelemetryRecord>, RepositoryError> {
        let db = self.db.read();
        let telemetry = column(&db, CF_TELEMETRY)?;
        prefix_scan(&db, telemetry, &node_id.0.to_be_bytes())?
            .iter()
            .map(|value| decode(value))
            .collect()
    }
}

impl NodeDirectory for RocksDbNodeStore {
    fn find_by_address(&self, address: &HardwareAddress) -> Result<Vec<NodeRecord>, RepositoryError> {
        let db = self.db.read();
        let nodes = column(&db, CF_NODES)?;
        prefix_scan(&db, nodes, &address_prefix(address))?
            .iter()
            .map(|value| decode(value))
            .collect()
    }

    fn insert(&mut self, node: &NewNode) -> Result<InsertResult, RepositoryError> {
        let db = self.db.write();
        let nodes = column(&db, CF_NODES)?;
        let meta = column(&db, CF_META)?;

        if !prefix_scan(&db, nodes, &address_prefix(&node.hardware_address))?.is_empty() {
            return Ok(InsertResult::rejected());
        }

        let id = NodeId(read_counter(&db, NODE_ID_SEQ)? + 1);
        let record = node.clone().into_record(id);

        let mut batch = WriteBatch::default();
        batch.put_cf(nodes, node_key(&record.hardware_address, id), encode(&record)?);
        batch.put_cf(meta, NODE_ID_SEQ, id.0.to_be_bytes());
        db.write_opt(batch, &self.write_options())
            .map_err(io_error("node insert"))?;

        Ok(InsertResult::inserted(id))
    }

    fn update(
        &mut self,
        address: &HardwareAddress,
        type_id: TypeId,
        network_address: IpAddr,
    ) -> Result<u64, RepositoryError> {
        let db = self.db.write();
        let nodes = column(&db, CF_NODES)?;

        let mut batch = WriteBatch::default();
        let mut affected = 0;
        for value in prefix_scan(&db, nodes, &address_prefix(address))? {
            let mut record: NodeRecord = decode(&value)?;
            record.type_id = type_id;
            record.network_address = network_address;
            batch.put_cf(nodes, node_key(address, record.id), encode(&record)?);
            affected += 1;
        }

        if affected > 0 {
            db.write_opt(batch, &self.write_options())
                .map_err(io_error("node update"))?;
        }
        Ok(affected)
    }
}

impl TypeRegistry for RocksDbNodeStore {
    fn find_by_id(&self, id: TypeId) -> Result<Vec<TypeDescriptor>, RepositoryError> {
        let db = self.db.read();
        let types = column(&db, CF_TYPES)?;
        match db.get_cf(types, id.0.to_be_bytes()).map_err(io_error("type read"))? {
            Some(bytes) => Ok(vec![decode(&bytes)?]),
            None => Ok(Vec::new()),
        }
    }
}

impl OptionsStore for RocksDbNodeStore {
    /// One record per node and type; a second insert affects nothing.
    fn insert_options(&mut self, record: &OptionsRecord) -> Result<u64, RepositoryError> {
        let db = self.db.write();
        let options = column(&db, CF_OPTIONS)?;
        let key = options_key(record.node_id, record.node_type());

        if db
            .get_pinned_cf(options, &key)
            .map_err(io_error("options read"))?
            .is_some()
        {
            return Ok(0);
        }

        db.put_cf_opt(options, key, encode(record)?, &self.write_options())
            .map_err(io_error("options insert"))?;
        Ok(1)
    }

    fn find_options(
        &self,
        node_id: NodeId,
        node_type: NodeType,
    ) -> Result<Vec<OptionsRecord>, RepositoryError> {
        let db = self.db.read();
        let options = column(&db, CF_OPTIONS)?;
        match db
            .get_cf(options, options_key(node_id, node_type))
            .map_err(io_error("options read"))?
        {
            Some(bytes) => Ok(vec![decode(&bytes)?]),
            None => Ok(Vec::new()),
        }
    }
}

impl TelemetryStore for RocksDbNodeStore {
    fn append(&mut self, record: &TelemetryRecord) -> Result<u64, RepositoryError> {
        let db = self.db.write();
        let telemetry = column(&db, CF_TELEMETRY)?;
        let meta = column(&db, CF_META)?;

        let seq = read_counter(&db, TELEMETRY_SEQ)? + 1;
        let mut key = record.node_id.0.to_be_bytes().to_vec();
        key.extend_from_slice(&record.timestamp.to_be_bytes());
        key.extend_from_slice(&seq.to_be_bytes());

        let mut batch = WriteBatch::default();
        batch.put_cf(telemetry, key, encode(record)?);
        batch.put_cf(meta, TELEMETRY_SEQ, seq.to_be_bytes());
        db.write_opt(batch, &self.write_options())
            .map_err(io_error("telemetry append"))?;
        Ok(1)
    }
}
