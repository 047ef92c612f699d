//! Record store abstraction and its RocksDB / in-memory backends

use crate::{
    error::{BenchError, BenchResult},
    record::{BenchmarkRecord, RecordKey},
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use rocksdb::{Options, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Key prefix for benchmark records
pub const RECORD_PREFIX: &str = "record";

/// Whether an upsert created a new record or replaced one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Persistence contract for benchmark records.
///
/// Upserts are atomic per record identity: concurrent writers for the same
/// `(algorithm, operation, key_size, data_size_label)` never interleave.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace the record with the same identity
    async fn upsert(&self, record: &BenchmarkRecord) -> BenchResult<UpsertOutcome>;

    /// Fetch one record by identity
    async fn get(&self, key: &RecordKey) -> BenchResult<Option<BenchmarkRecord>>;

    /// Every stored record, ordered by identity
    async fn load_all(&self) -> BenchResult<Vec<BenchmarkRecord>>;

    /// Number of stored records
    async fn count(&self) -> BenchResult<usize>;
}

/// RocksDB-backed record store
pub struct RocksRecordStore {
    db: Arc<DB>,
    key_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RocksRecordStore {
    /// Open (or create) a store at `path`
    pub fn open(path: impl AsRef<Path>) -> BenchResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_open_files(256);
        opts.set_use_fsync(false);
        opts.set_bytes_per_sync(1048576);
        opts.set_write_buffer_size(16 * 1024 * 1024);
        opts.set_compaction_style(rocksdb::DBCompactionStyle::Level);

        let path = path.as_ref();
        let db = DB::open(&opts, path).map_err(|e| {
            BenchError::store(format!(
                "Failed to open record store at {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!("Opened record store at {}", path.display());

        Ok(Self {
            db: Arc::new(db),
            key_locks: DashMap::new(),
        })
    }

    /// Format key with prefix
    fn format_key(key: &RecordKey) -> String {
        format!("{}:{}", RECORD_PREFIX, key)
    }

    fn lock_for(&self, formatted_key: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(formatted_key.to_string())
            .or_default()
            .clone()
    }

    // Drop the key's lock once no other writer holds or waits on it
    fn release_lock(&self, formatted_key: &str) {
        self.key_locks
            .remove_if(formatted_key, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Returns whether the key already existed
    fn write_record(&self, formatted_key: &str, encoded: &[u8]) -> BenchResult<bool> {
        let existed = self.db.get_pinned(formatted_key.as_bytes())?.is_some();
        self.db.put(formatted_key.as_bytes(), encoded)?;
        Ok(existed)
    }

    /// Get database statistics
    pub fn stats(&self) -> BenchResult<String> {
        self.db
            .property_value("rocksdb.stats")
            .map_err(BenchError::from)
            .map(|opt| opt.unwrap_or_else(|| "No stats available".to_string()))
    }
}

#[async_trait]
impl RecordStore for RocksRecordStore {
    async fn upsert(&self, record: &BenchmarkRecord) -> BenchResult<UpsertOutcome> {
        let formatted_key = Self::format_key(&record.key());
        let encoded = serde_json::to_vec(record)?;

        let lock = self.lock_for(&formatted_key);
        let guard = lock.lock();
        let written = self.write_record(&formatted_key, &encoded);
        drop(guard);
        drop(lock);
        self.release_lock(&formatted_key);

        Ok(if written? {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    async fn get(&self, key: &RecordKey) -> BenchResult<Option<BenchmarkRecord>> {
        let formatted_key = Self::format_key(key);
        match self.db.get(formatted_key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn load_all(&self) -> BenchResult<Vec<BenchmarkRecord>> {
        let mut records = Vec::new();
        let prefix_with_separator = format!("{}:", RECORD_PREFIX);
        let prefix_bytes = prefix_with_separator.as_bytes();

        let iter = self.db.iterator(rocksdb::IteratorMode::From(
            prefix_bytes,
            rocksdb::Direction::Forward,
        ));

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix_bytes) {
                break;
            }
            let record: BenchmarkRecord = serde_json::from_slice(&value).map_err(|e| {
                BenchError::store(format!(
                    "Corrupt record under {}: {}",
                    String::from_utf8_lossy(&key),
                    e
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    async fn count(&self) -> BenchResult<usize> {
        Ok(self.load_all().await?.len())
    }
}

/// In-memory record store, used by tests and dry runs
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<RecordKey, BenchmarkRecord>,
}

impl MemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(&self, record: &BenchmarkRecord) -> BenchResult<UpsertOutcome> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(record.key()) {
            Entry::Occupied(mut slot) => {
                slot.insert(record.clone());
                Ok(UpsertOutcome::Updated)
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn get(&self, key: &RecordKey) -> BenchResult<Option<BenchmarkRecord>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    async fn load_all(&self) -> BenchResult<Vec<BenchmarkRecord>> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.key());
        Ok(records)
    }

    async fn count(&self) -> BenchResult<usize> {
        Ok(self.records.len())
    }
}
