use std::collections::BTreeMap;

use tracelot_core::ServiceError;
use tracing::{info, warn};

use crate::model::{Activity, ConservationViolation, ProductLot};

use super::TraceService;

/// Absolute tolerance when comparing summed quantities.
const TOLERANCE: f64 = 1e-6;

impl TraceService {
    /// Check every lot against the activity ledger.
    ///
    /// Violations are reported per lot, ordered by lot id; unknown inputs
    /// follow, ordered by activity id. An empty result means every lot's
    /// consumed quantity matches what activities recorded taking from it.
    pub fn audit_conservation(&self) -> Result<Vec<ConservationViolation>, ServiceError> {
        let lots: BTreeMap<String, ProductLot> = self
            .query
            .scan_all::<ProductLot>()?
            .into_iter()
            .map(|lot| (lot.id.clone(), lot))
            .collect();
        let mut activities = self.query.scan_all::<Activity>()?;
        activities.sort_by(|a, b| a.id.cmp(&b.id));

        let mut ledger: BTreeMap<&str, f64> = BTreeMap::new();
        let mut unknown = Vec::new();
        for activity in &activities {
            for (lot_id, used) in &activity.input_product_lots {
                if lots.contains_key(lot_id) {
                    *ledger.entry(lot_id.as_str()).or_insert(0.0) += used;
                } else {
                    unknown.push(ConservationViolation::UnknownInput {
                        activity_id: activity.id.clone(),
                        lot_id: lot_id.clone(),
                    });
                }
            }
        }

        let mut violations = Vec::new();
        for lot in lots.values() {
            let in_range = lot.available_quantity >= -TOLERANCE
                && lot.available_quantity <= lot.initial_quantity + TOLERANCE;
            if !in_range {
                violations.push(ConservationViolation::QuantityOutOfRange {
                    lot_id: lot.id.clone(),
                    initial_quantity: lot.initial_quantity,
                    available_quantity: lot.available_quantity,
                });
            }

            let recorded = lot.consumed_quantity();
            let consumed = ledger.get(lot.id.as_str()).copied().unwrap_or(0.0);
            if (recorded - consumed).abs() > TOLERANCE {
                violations.push(ConservationViolation::LedgerMismatch {
                    lot_id: lot.id.clone(),
                    recorded_consumption: recorded,
                    ledger_consumption: consumed,
                });
            }
        }
        violations.extend(unknown);

        if violations.is_empty() {
            info!(
                "conservation audit clean: {} lot(s), {} activity(ies)",
                lots.len(),
                activities.len()
            );
        } else {
            let affected: Vec<&str> = violations.iter().map(|v| v.lot_id()).collect();
            warn!(
                "conservation audit found {} violation(s) on {}",
                violations.len(),
                affected.join(", ")
            );
        }
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tracelot_kv::KVStore;

    use super::super::testing::{new_lot, service};
    use super::*;
    use crate::model::NewActivity;
    use crate::store::RecordStore;

    fn consume(svc: &TraceService, id: &str, input: &str, qty: f64, output: &str, reference: &str) {
        svc.create_activity(NewActivity {
            id: id.into(),
            designation: String::new(),
            user_id: "u".into(),
            input_product_lots: BTreeMap::from([(input.to_string(), qty)]),
            output_product_lot: new_lot(output, reference, qty),
        })
        .unwrap();
    }

    #[test]
    fn clean_after_activities() {
        let (svc, _kv, _dir) = service();
        assert!(svc.audit_conservation().unwrap().is_empty());

        svc.create_product_lot(new_lot("steel-1", "R1", 100.0)).unwrap();
        consume(&svc, "cut-1", "steel-1", 40.0, "plate-1", "R2");
        consume(&svc, "cut-2", "steel-1", 0.1, "plate-2", "R3");
        consume(&svc, "cut-3", "steel-1", 0.2, "plate-3", "R4");
        consume(&svc, "bend-1", "plate-1", 40.0, "bracket-1", "R5");

        assert!(svc.audit_conservation().unwrap().is_empty());
    }

    #[test]
    fn manual_quantity_edit_shows_as_mismatch() {
        let (svc, _kv, _dir) = service();
        svc.create_product_lot(new_lot("steel-1", "R1", 100.0)).unwrap();
        consume(&svc, "cut-1", "steel-1", 40.0, "plate-1", "R2");
        svc.update_product_available_quantity("steel-1", 50.0).unwrap();

        let violations = svc.audit_conservation().unwrap();
        assert_eq!(
            violations,
            vec![ConservationViolation::LedgerMismatch {
                lot_id: "steel-1".into(),
                recorded_consumption: 50.0,
                ledger_consumption: 40.0,
            }]
        );
    }

    #[test]
    fn reports_out_of_range_and_unknown_inputs() {
        let (svc, kv, _dir) = service();
        svc.create_product_lot(new_lot("steel-1", "R1", 100.0)).unwrap();
        consume(&svc, "cut-1", "steel-1", 10.0, "plate-1", "R2");

        // Corrupt the lot directly and remove the one the activity consumed.
        let mut plate = svc.read_product_lot("plate-1").unwrap();
        plate.available_quantity = 12.0;
        let bytes = RecordStore::<ProductLot>::encode(&plate).unwrap();
        kv.set(&RecordStore::<ProductLot>::key("plate-1"), &bytes).unwrap();
        kv.delete(&RecordStore::<ProductLot>::key("steel-1")).unwrap();

        let violations = svc.audit_conservation().unwrap();
        assert_eq!(violations.len(), 3, "{violations:?}");
        assert!(matches!(
            &violations[0],
            ConservationViolation::QuantityOutOfRange { lot_id, .. } if lot_id == "plate-1"
        ));
        assert!(matches!(
            &violations[1],
            ConservationViolation::LedgerMismatch { lot_id, .. } if lot_id == "plate-1"
        ));
        assert_eq!(
            violations[2],
            ConservationViolation::UnknownInput {
                activity_id: "cut-1".into(),
                lot_id: "steel-1".into(),
            }
        );
    }
}
