pub mod activity;
pub mod audit;
pub mod lineage;
pub mod product;

use std::sync::Arc;

use tracelot_core::ServiceError;
use tracelot_kv::KVStore;

use crate::model::{Activity, ProductLot};
use crate::query::QueryAdapter;
use crate::store::RecordStore;

/// Owns the typed views over the backing store and provides
/// every caller-facing operation.
pub struct TraceService {
    pub(crate) kv: Arc<dyn KVStore>,
    pub(crate) lots: RecordStore<ProductLot>,
    pub(crate) activities: RecordStore<Activity>,
    pub(crate) query: QueryAdapter,
}

impl TraceService {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            lots: RecordStore::new(Arc::clone(&kv)),
            activities: RecordStore::new(Arc::clone(&kv)),
            query: QueryAdapter::new(Arc::clone(&kv)),
            kv,
        }
    }
}

/// Ids become key suffixes; they must be non-empty.
pub(crate) fn require_id(id: &str, what: &str) -> Result<(), ServiceError> {
    if id.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} id must not be empty", what)));
    }
    Ok(())
}

/// Quantities must be finite and non-negative.
pub(crate) fn require_quantity(quantity: f64, what: &str) -> Result<(), ServiceError> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(ServiceError::InvalidQuantity(format!(
            "{} must be a finite, non-negative number (got {})",
            what, quantity
        )));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_validation() {
        assert!(require_id("steel-1", "lot").is_ok());
        assert!(matches!(require_id("", "lot"), Err(ServiceError::Validation(_))));
        assert!(matches!(require_id("  ", "lot"), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn quantity_validation() {
        assert!(require_quantity(0.0, "q").is_ok());
        assert!(require_quantity(12.5, "q").is_ok());
        assert!(matches!(require_quantity(-1.0, "q"), Err(ServiceError::InvalidQuantity(_))));
        assert!(matches!(require_quantity(f64::NAN, "q"), Err(ServiceError::InvalidQuantity(_))));
        assert!(matches!(
            require_quantity(f64::INFINITY, "q"),
            Err(ServiceError::InvalidQuantity(_))
        ));
    }
}
