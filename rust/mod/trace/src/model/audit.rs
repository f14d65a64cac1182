use serde::Serialize;

/// A broken quantity invariant found by the conservation audit.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConservationViolation {
    /// `available_quantity` is outside `[0, initial_quantity]`.
    #[serde(rename_all = "camelCase")]
    QuantityOutOfRange {
        lot_id: String,
        initial_quantity: f64,
        available_quantity: f64,
    },

    /// `initial − available` differs from what activities say was consumed.
    #[serde(rename_all = "camelCase")]
    LedgerMismatch {
        lot_id: String,
        recorded_consumption: f64,
        ledger_consumption: f64,
    },

    /// An activity consumed a lot that does not exist.
    #[serde(rename_all = "camelCase")]
    UnknownInput { activity_id: String, lot_id: String },
}

impl ConservationViolation {
    pub fn lot_id(&self) -> &str {
        match self {
            ConservationViolation::QuantityOutOfRange { lot_id, .. }
            | ConservationViolation::LedgerMismatch { lot_id, .. }
            | ConservationViolation::UnknownInput { lot_id, .. } => lot_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_json() {
        let v = ConservationViolation::LedgerMismatch {
            lot_id: "steel-1".into(),
            recorded_consumption: 50.0,
            ledger_consumption: 40.0,
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "ledgerMismatch");
        assert_eq!(json["lotId"], "steel-1");
        assert_eq!(json["recordedConsumption"], 50.0);
        assert_eq!(v.lot_id(), "steel-1");
    }
}
