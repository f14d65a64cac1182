//! Record trait + RecordStore typed CRUD over a `KVStore`.
//!
//! Each entity kind impls `Record` to declare its document type and key
//! namespace. `RecordStore<T>` provides exists/read/update and stages creates
//! into a `WriteBatch`, so a new record can be committed together with the
//! other writes it depends on.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracelot_core::ServiceError;
use tracelot_kv::{KVError, KVStore, WriteBatch};

use crate::model::{Activity, ProductLot};

/// Field carrying the kind discriminant in every stored document.
pub const DOC_TYPE_FIELD: &str = "docType";

/// Trait implemented by persisted entity kinds.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Value of the `docType` field, e.g. `"productLot"`.
    const DOC_TYPE: &'static str;

    /// Human-readable kind name used in error messages.
    const LABEL: &'static str;

    /// KV key prefix: "trace:{kind}:".
    fn kv_prefix() -> &'static str;

    /// Extract the key value from this instance.
    fn key_value(&self) -> &str;
}

impl Record for ProductLot {
    const DOC_TYPE: &'static str = "productLot";
    const LABEL: &'static str = "product lot";

    fn kv_prefix() -> &'static str {
        "trace:lot:"
    }

    fn key_value(&self) -> &str {
        &self.id
    }
}

impl Record for Activity {
    const DOC_TYPE: &'static str = "activity";
    const LABEL: &'static str = "activity";

    fn kv_prefix() -> &'static str {
        "trace:activity:"
    }

    fn key_value(&self) -> &str {
        &self.id
    }
}

/// Namespace of the reference number index: `trace:ref:{referenceNumber}`
/// holds the id of the lot that owns the reference.
pub const REFERENCE_PREFIX: &str = "trace:ref:";

pub fn reference_key(reference_number: &str) -> String {
    format!("{}{}", REFERENCE_PREFIX, reference_number)
}

/// Map a backing-store failure onto the service taxonomy.
pub(crate) fn kv_err(e: KVError) -> ServiceError {
    match e {
        KVError::Conflict(key) => ServiceError::Conflict(format!(
            "'{}' was modified concurrently, nothing was written",
            key
        )),
        other => ServiceError::Storage(other.to_string()),
    }
}

/// Keyed operations for one `Record` kind.
pub struct RecordStore<T: Record> {
    kv: Arc<dyn KVStore>,
    _phantom: PhantomData<T>,
}

impl<T: Record> RecordStore<T> {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            kv,
            _phantom: PhantomData,
        }
    }

    pub fn key(id: &str) -> String {
        format!("{}{}", T::kv_prefix(), id)
    }

    /// Serialize a record, tagging it with its `docType`.
    pub fn encode(record: &T) -> Result<Vec<u8>, ServiceError> {
        let mut doc = serde_json::to_value(record)
            .map_err(|e| ServiceError::Internal(format!("serialize {}: {}", T::LABEL, e)))?;
        match doc.as_object_mut() {
            Some(obj) => {
                obj.insert(DOC_TYPE_FIELD.to_string(), Value::from(T::DOC_TYPE));
            }
            None => {
                return Err(ServiceError::Internal(format!(
                    "{} does not serialize to an object",
                    T::LABEL
                )))
            }
        }
        serde_json::to_vec(&doc)
            .map_err(|e| ServiceError::Internal(format!("serialize {}: {}", T::LABEL, e)))
    }

    /// Deserialize stored bytes, rejecting documents of another kind.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<T, ServiceError> {
        let corrupt = |detail: String| {
            ServiceError::CorruptRecord(format!(
                "stored {} at '{}' is unreadable: {}",
                T::LABEL,
                key,
                detail
            ))
        };

        let doc: Value = serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
        match doc.get(DOC_TYPE_FIELD).and_then(Value::as_str) {
            Some(doc_type) if doc_type == T::DOC_TYPE => {}
            Some(other) => return Err(corrupt(format!("docType is '{}'", other))),
            None => return Err(corrupt("missing docType".to_string())),
        }
        serde_json::from_value(doc).map_err(|e| corrupt(e.to_string()))
    }

    /// Whether a record with this id exists. Store failures are errors,
    /// never `false`.
    pub fn exists(&self, id: &str) -> Result<bool, ServiceError> {
        Ok(self.kv.get(&Self::key(id)).map_err(kv_err)?.is_some())
    }

    /// Get a record by id. Returns None if not found.
    pub fn get(&self, id: &str) -> Result<Option<T>, ServiceError> {
        Ok(self.get_raw(id)?.map(|(record, _)| record))
    }

    /// Get a record together with the exact bytes it was decoded from,
    /// for use as a commit precondition.
    pub fn get_raw(&self, id: &str) -> Result<Option<(T, Vec<u8>)>, ServiceError> {
        let key = Self::key(id);
        match self.kv.get(&key).map_err(kv_err)? {
            Some(bytes) => Ok(Some((Self::decode(&key, &bytes)?, bytes))),
            None => Ok(None),
        }
    }

    /// Get a record or return NotFound.
    pub fn read(&self, id: &str) -> Result<T, ServiceError> {
        self.get(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}' not found", T::LABEL, id)))
    }

    /// Stage the insert of a new record: the write only lands if the key is
    /// still free at commit time.
    pub fn stage_create(batch: &mut WriteBatch, record: &T) -> Result<(), ServiceError> {
        let key = Self::key(record.key_value());
        batch.expect_absent(key.clone()).put(key, Self::encode(record)?);
        Ok(())
    }

    /// Read, mutate and write back the whole record.
    ///
    /// The write only lands if the stored bytes are still the ones that were
    /// read; otherwise the call fails with Conflict.
    pub fn update<F>(&self, id: &str, mutate: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut T) -> Result<(), ServiceError>,
    {
        let (mut record, raw) = self
            .get_raw(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}' not found", T::LABEL, id)))?;

        mutate(&mut record)?;
        if record.key_value() != id {
            return Err(ServiceError::Validation(format!(
                "{} id cannot change ('{}' -> '{}')",
                T::LABEL,
                id,
                record.key_value()
            )));
        }

        let key = Self::key(id);
        let mut batch = WriteBatch::new();
        batch.expect(key.clone(), Some(raw)).put(key, Self::encode(&record)?);
        self.kv.commit(&batch).map_err(kv_err)?;

        Ok(record)
    }

    pub(crate) fn already_exists(id: &str) -> ServiceError {
        ServiceError::AlreadyExists(format!("{} '{}' already exists", T::LABEL, id))
    }
}
