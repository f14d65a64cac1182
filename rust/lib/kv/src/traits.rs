use crate::batch::WriteBatch;
use crate::error::KVError;
use crate::selector::Selector;

/// KVStore provides the key-value storage interface the trace records live in.
///
/// Keys follow a namespaced convention: `trace:lot:steel-1`, `trace:activity:cut-1`.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Apply every write in `batch` as one unit, or none of them.
    ///
    /// All preconditions are checked inside the same transaction as the
    /// writes. The first one that does not hold aborts the batch with
    /// `KVError::Conflict(key)`.
    fn commit(&self, batch: &WriteBatch) -> Result<(), KVError>;

    /// Filtered scan: entries under `prefix` whose JSON document matches
    /// every field of `selector`.
    ///
    /// The default drains `scan` and filters in memory. Stores with a native
    /// document index can override it.
    fn find(
        &self,
        prefix: &str,
        selector: &Selector,
    ) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        Ok(self
            .scan(prefix)?
            .into_iter()
            .filter(|(_, value)| selector.matches(value))
            .collect())
    }
}
