use tracelot_core::{now_rfc3339, ServiceError};
use tracelot_kv::{KVError, WriteBatch};
use tracing::{debug, info, warn};

use crate::model::{Activity, NewActivity, ProductLot};
use crate::store::{kv_err, RecordStore};

use super::product::{new_lot_err, stage_new_lot};
use super::{require_id, require_quantity, TraceService};

impl TraceService {
    // ── Activities ──

    /// Record an activity: consume the input quantities and create the
    /// output lot.
    ///
    /// Every check runs before anything is written. The decremented inputs,
    /// the output lot and the activity are then committed as one batch,
    /// conditional on the inputs being unchanged since they were read and
    /// on the activity id, the output id and the output reference number
    /// still being free. A call that fails
    /// for any reason leaves the store exactly as it found it.
    pub fn create_activity(&self, input: NewActivity) -> Result<String, ServiceError> {
        let NewActivity {
            id,
            designation,
            user_id,
            input_product_lots,
            output_product_lot,
        } = input;

        require_id(&id, "activity")?;
        require_id(&output_product_lot.id, "output product lot")?;
        if input_product_lots.is_empty() {
            return Err(ServiceError::Validation(format!(
                "activity '{}' must consume at least one product lot",
                id
            )));
        }

        if self.activities.exists(&id)? {
            return Err(ServiceError::AlreadyExists(format!(
                "activity '{}' already exists",
                id
            )));
        }

        let mut batch = WriteBatch::new();

        // Inputs, in lot id order.
        for (lot_id, &used) in &input_product_lots {
            let (mut lot, raw) = self.lots.get_raw(lot_id)?.ok_or_else(|| {
                ServiceError::NotFound(format!("input product lot '{}' does not exist", lot_id))
            })?;

            if !used.is_finite() || used <= 0.0 {
                return Err(ServiceError::InvalidQuantity(format!(
                    "used quantity must be greater than 0 (got {} for input product lot '{}')",
                    used, lot_id
                )));
            }
            if used > lot.available_quantity {
                return Err(ServiceError::InvalidQuantity(format!(
                    "used quantity {:.2} exceeds the available quantity {:.2} of input product lot '{}'",
                    used, lot.available_quantity, lot_id
                )));
            }

            lot.available_quantity -= used;
            debug!(
                "activity {}: staging {} -> available {}",
                id, lot_id, lot.available_quantity
            );

            let key = RecordStore::<ProductLot>::key(lot_id);
            let bytes = RecordStore::<ProductLot>::encode(&lot)?;
            batch.expect(key.clone(), Some(raw)).put(key, bytes);
        }

        // Output.
        if self.lots.exists(&output_product_lot.id)? {
            return Err(ServiceError::AlreadyExists(format!(
                "output product lot '{}' already exists",
                output_product_lot.id
            )));
        }
        self.ensure_reference_free(&output_product_lot.reference_number)?;
        require_quantity(output_product_lot.effective_quantity(), "output initial quantity")?;

        let output = output_product_lot.into_lot();
        stage_new_lot(&mut batch, &output)?;

        let activity = Activity {
            id,
            designation,
            user_id,
            date_time: now_rfc3339(),
            input_product_lots,
            output_product_lot: output,
        };
        let activity_key = RecordStore::<Activity>::key(&activity.id);
        RecordStore::<Activity>::stage_create(&mut batch, &activity)?;

        self.kv.commit(&batch).map_err(|e| match e {
            KVError::Conflict(key) if key == activity_key => {
                RecordStore::<Activity>::already_exists(&activity.id)
            }
            other => match new_lot_err(other, &activity.output_product_lot) {
                ServiceError::Conflict(msg) => {
                    warn!("activity {} rejected at commit: {}", activity.id, msg);
                    ServiceError::Conflict(msg)
                }
                err => err,
            },
        })?;

        info!(
            "activity {} created: {} input(s) -> {}",
            activity.id,
            activity.input_product_lots.len(),
            activity.output_product_lot.id
        );
        Ok(format!("{} created successfully", activity.id))
    }

    pub fn read_activity(&self, id: &str) -> Result<Activity, ServiceError> {
        self.activities.read(id)
    }

    pub fn get_all_activities(&self) -> Result<Vec<Activity>, ServiceError> {
        self.query.scan_all()
    }
}
