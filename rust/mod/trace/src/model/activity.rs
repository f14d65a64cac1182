use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{NewProductLot, ProductLot};

/// A transformation event: consumes quantities of existing lots
/// and produces exactly one new lot. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(default)]
    pub designation: String,

    /// Identity that performed the activity. Opaque.
    #[serde(default)]
    pub user_id: String,

    /// RFC 3339, assigned when the activity is processed.
    pub date_time: String,

    /// Input lot id → quantity consumed.
    #[serde(default)]
    pub input_product_lots: BTreeMap<String, f64>,

    /// The lot this activity produced, as it was created.
    pub output_product_lot: ProductLot,
}

/// Request to record an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(alias = "ID")]
    pub id: String,

    #[serde(default)]
    pub designation: String,

    #[serde(default)]
    pub user_id: String,

    pub input_product_lots: BTreeMap<String, f64>,

    pub output_product_lot: NewProductLot,
}
