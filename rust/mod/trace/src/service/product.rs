use tracelot_core::ServiceError;
use tracelot_kv::{KVError, WriteBatch};
use tracing::{debug, info};

use crate::model::{NewProductLot, ProductLot};
use crate::store::{kv_err, reference_key, RecordStore};

use super::{require_id, require_quantity, TraceService};

const REFERENCE_NUMBER_FIELD: &str = "referenceNumber";

impl TraceService {
    // ── Product lots ──

    /// Create a standalone (raw material) lot.
    pub fn create_product_lot(&self, input: NewProductLot) -> Result<String, ServiceError> {
        require_id(&input.id, "product lot")?;
        require_quantity(input.effective_quantity(), "initial quantity")?;

        if self.lots.exists(&input.id)? {
            return Err(ServiceError::AlreadyExists(format!(
                "product lot '{}' already exists",
                input.id
            )));
        }
        self.ensure_reference_free(&input.reference_number)?;

        let lot = input.into_lot();
        let mut batch = WriteBatch::new();
        stage_new_lot(&mut batch, &lot)?;
        self.kv.commit(&batch).map_err(|e| new_lot_err(e, &lot))?;

        info!(
            "product lot {} created (ref {}, quantity {})",
            lot.id, lot.reference_number, lot.initial_quantity
        );
        Ok(format!("{} created successfully", lot.id))
    }

    pub fn read_product_lot(&self, id: &str) -> Result<ProductLot, ServiceError> {
        self.lots.read(id)
    }

    /// Look a lot up by its business reference (serial or lot number).
    pub fn read_product_lot_by_reference_number(
        &self,
        reference_number: &str,
    ) -> Result<ProductLot, ServiceError> {
        debug!("resolving reference number {}", reference_number);
        self.query
            .find_unique::<ProductLot>(REFERENCE_NUMBER_FIELD, reference_number)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "product lot with reference number '{}' not found",
                    reference_number
                ))
            })
    }

    /// Replace the document keys of a lot.
    pub fn update_product_lot_document_keys(
        &self,
        id: &str,
        document_keys: Vec<String>,
    ) -> Result<String, ServiceError> {
        self.lots.update(id, |lot| {
            lot.document_keys = document_keys;
            Ok(())
        })?;

        info!("product lot {} document keys updated", id);
        Ok(format!("{} document keys updated successfully", id))
    }

    /// Overwrite the available quantity of a lot.
    ///
    /// Only range checks apply; the value is not reconciled with the
    /// activities that consumed the lot. `audit_conservation` reports any
    /// drift this introduces.
    pub fn update_product_available_quantity(
        &self,
        id: &str,
        available_quantity: f64,
    ) -> Result<String, ServiceError> {
        require_quantity(available_quantity, "available quantity")?;

        self.lots.update(id, |lot| {
            if available_quantity > lot.initial_quantity {
                return Err(ServiceError::InvalidQuantity(format!(
                    "available quantity {:.2} exceeds the initial quantity {:.2} of product lot '{}'",
                    available_quantity, lot.initial_quantity, lot.id
                )));
            }
            if lot.is_serial_number && available_quantity != 0.0 && available_quantity != 1.0 {
                return Err(ServiceError::Validation(format!(
                    "serial-number product lot '{}' can only hold 0 or 1",
                    lot.id
                )));
            }
            lot.available_quantity = available_quantity;
            Ok(())
        })?;

        info!("product lot {} available quantity set to {}", id, available_quantity);
        Ok(format!(
            "{} available quantity updated successfully to {:.2}",
            id, available_quantity
        ))
    }

    pub fn get_all_product_lots(&self) -> Result<Vec<ProductLot>, ServiceError> {
        self.query.scan_all()
    }

    pub(crate) fn ensure_reference_free(&self, reference_number: &str) -> Result<(), ServiceError> {
        let owner = self
            .kv
            .get(&reference_key(reference_number))
            .map_err(kv_err)?;
        if let Some(owner) = owner {
            return Err(ServiceError::AlreadyExists(format!(
                "reference number '{}' is already used by product lot '{}'",
                reference_number,
                String::from_utf8_lossy(&owner)
            )));
        }
        Ok(())
    }
}

/// Stage the insert of a new lot together with the claim on its reference
/// number. Both keys must still be free when the batch commits.
pub(crate) fn stage_new_lot(batch: &mut WriteBatch, lot: &ProductLot) -> Result<(), ServiceError> {
    RecordStore::<ProductLot>::stage_create(batch, lot)?;
    let key = reference_key(&lot.reference_number);
    batch.expect_absent(key.clone()).put(key, lot.id.clone().into_bytes());
    Ok(())
}

/// Commit failure of a batch holding `stage_new_lot`: losing the race for
/// the lot id or the reference number is AlreadyExists.
pub(crate) fn new_lot_err(e: KVError, lot: &ProductLot) -> ServiceError {
    match e {
        KVError::Conflict(key) if key == reference_key(&lot.reference_number) => {
            ServiceError::AlreadyExists(format!(
                "reference number '{}' is already used by another product lot",
                lot.reference_number
            ))
        }
        KVError::Conflict(key) if key == RecordStore::<ProductLot>::key(&lot.id) => {
            RecordStore::<ProductLot>::already_exists(&lot.id)
        }
        other => kv_err(other),
    }
}
