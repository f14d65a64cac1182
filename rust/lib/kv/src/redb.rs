use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::batch::WriteBatch;
use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust embedded
/// key-value database. Write transactions are serialized by redb, which is what
/// makes `commit` atomic.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(|e| KVError::Storage(e.to_string()))?;

        // Ensure the table exists by doing a write transaction.
        let write_txn = db
            .begin_write()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        {
            let _table = write_txn
                .open_table(TABLE)
                .map_err(|e| KVError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| KVError::Storage(e.to_string()))?;

        debug!("RedbStore: opened {:?}", path);
        Ok(Self {
            db: Arc::new(db),
        })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| KVError::Storage(e.to_string()))?;

        match table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(KVError::Storage(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| KVError::Storage(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| KVError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| KVError::Storage(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| KVError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| KVError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        let iter = table
            .range(prefix..)
            .map_err(|e| KVError::Storage(e.to_string()))?;

        for entry in iter {
            let entry = entry.map_err(|e| KVError::Storage(e.to_string()))?;
            let key = entry.0.value().to_string();
            if !key.starts_with(prefix) {
                break;
            }
            let value = entry.1.value().to_vec();
            results.push((key, value));
        }

        Ok(results)
    }

    fn commit(&self, batch: &WriteBatch) -> Result<(), KVError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| KVError::Storage(e.to_string()))?;

        let conflict = {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| KVError::Storage(e.to_string()))?;

            let mut conflict = None;
            for (key, expected) in batch.expectations() {
                let current = table
                    .get(key.as_str())
                    .map_err(|e| KVError::Storage(e.to_string()))?
                    .map(|v| v.value().to_vec());
                if current != *expected {
                    conflict = Some(key.clone());
                    break;
                }
            }

            if conflict.is_none() {
                for (key, value) in batch.puts() {
                    table
                        .insert(key.as_str(), value.as_slice())
                        .map_err(|e| KVError::Storage(e.to_string()))?;
                }
            }
            conflict
        };

        if let Some(key) = conflict {
            debug!("RedbStore: batch aborted, precondition failed on {}", key);
            write_txn
                .abort()
                .map_err(|e| KVError::Storage(e.to_string()))?;
            return Err(KVError::Conflict(key));
        }

        write_txn
            .commit()
            .map_err(|e| KVError::Storage(e.to_string()))?;
        debug!("RedbStore: batch committed, {} write(s)", batch.len());
        Ok(())
    }
}
