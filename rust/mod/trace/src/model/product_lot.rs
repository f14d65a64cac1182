use serde::{Deserialize, Serialize};

/// A quantity-bearing batch, or a single serialized unit when
/// `is_serial_number` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductLot {
    #[serde(rename = "ID")]
    pub id: String,

    /// Serial number when `is_serial_number`, lot number otherwise.
    /// Unique across all lots.
    pub reference_number: String,

    #[serde(default)]
    pub is_serial_number: bool,

    #[serde(default)]
    pub designation: String,

    #[serde(default)]
    pub product_type: String,

    /// Fixed at creation.
    pub initial_quantity: f64,

    /// Decreases as activities consume the lot.
    pub available_quantity: f64,

    /// Opaque references to external documents, in caller order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_keys: Vec<String>,
}

impl ProductLot {
    /// Quantity already consumed by activities.
    pub fn consumed_quantity(&self) -> f64 {
        self.initial_quantity - self.available_quantity
    }
}

/// Caller-supplied description of a lot to create, either standalone or as
/// the output of an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProductLot {
    #[serde(alias = "ID")]
    pub id: String,

    pub reference_number: String,

    #[serde(default)]
    pub is_serial_number: bool,

    #[serde(default)]
    pub designation: String,

    #[serde(default)]
    pub product_type: String,

    /// Ignored for serial-number lots, which always hold exactly 1.
    #[serde(default)]
    pub initial_quantity: f64,

    #[serde(default)]
    pub document_keys: Vec<String>,
}

impl NewProductLot {
    /// The quantity the lot will actually be created with.
    pub fn effective_quantity(&self) -> f64 {
        if self.is_serial_number {
            1.0
        } else {
            self.initial_quantity
        }
    }

    /// Build the record to persist: the whole quantity starts out available.
    pub fn into_lot(self) -> ProductLot {
        let quantity = self.effective_quantity();
        ProductLot {
            id: self.id,
            reference_number: self.reference_number,
            is_serial_number: self.is_serial_number,
            designation: self.designation,
            product_type: self.product_type,
            initial_quantity: quantity,
            available_quantity: quantity,
            document_keys: self.document_keys,
        }
    }
}
