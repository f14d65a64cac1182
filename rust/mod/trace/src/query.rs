use std::sync::Arc;

use serde_json::Value;
use tracelot_core::ServiceError;
use tracelot_kv::{KVStore, Selector};
use tracing::debug;

use crate::store::{kv_err, Record, RecordStore, DOC_TYPE_FIELD};

/// Filtered scans over the backing store, typed by record kind.
pub struct QueryAdapter {
    kv: Arc<dyn KVStore>,
}

impl QueryAdapter {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    /// Every record of kind `T` whose `field` equals `value`.
    ///
    /// Result order is whatever the store returns.
    pub fn find_by_field<T: Record>(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<T>, ServiceError> {
        let selector = Selector::new()
            .eq(DOC_TYPE_FIELD, T::DOC_TYPE)
            .eq(field, value);
        debug!("query {}", selector.to_query_string());

        let entries = self.kv.find(T::kv_prefix(), &selector).map_err(kv_err)?;
        entries
            .iter()
            .map(|(key, bytes)| RecordStore::<T>::decode(key, bytes))
            .collect()
    }

    /// The single record of kind `T` whose `field` equals `value`, for
    /// fields that are unique by invariant. More than one match is reported
    /// as Ambiguous rather than picking one.
    pub fn find_unique<T: Record>(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, ServiceError> {
        let mut matches = self.find_by_field::<T>(field, value)?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            n => {
                let ids: Vec<&str> = matches.iter().map(|r| r.key_value()).collect();
                Err(ServiceError::Ambiguous(format!(
                    "{} {} records share {} '{}': {}",
                    n,
                    T::LABEL,
                    field,
                    value,
                    ids.join(", ")
                )))
            }
        }
    }

    /// Every record of kind `T`.
    pub fn scan_all<T: Record>(&self) -> Result<Vec<T>, ServiceError> {
        let entries = self.kv.scan(T::kv_prefix()).map_err(kv_err)?;
        entries
            .iter()
            .map(|(key, bytes)| RecordStore::<T>::decode(key, bytes))
            .collect()
    }
}
