use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Activity, ProductLot};

/// A node of a lineage tree: a product lot plus, unless it is raw material,
/// the activity that produced it.
///
/// Built per call and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductTraceability {
    #[serde(flatten)]
    pub lot: ProductLot,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityTraceability>,
}

/// The producing activity of a traced lot, with one subtree per input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTraceability {
    #[serde(rename = "ID")]
    pub id: String,

    pub designation: String,

    pub user_id: String,

    pub date_time: String,

    /// Quantity consumed from each input, keyed by lot id.
    #[serde(default)]
    pub input_quantities: BTreeMap<String, f64>,

    /// Input subtrees, ordered by lot id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_product_lots: Vec<ProductTraceability>,
}

impl ActivityTraceability {
    pub fn new(activity: &Activity, inputs: Vec<ProductTraceability>) -> Self {
        Self {
            id: activity.id.clone(),
            designation: activity.designation.clone(),
            user_id: activity.user_id.clone(),
            date_time: activity.date_time.clone(),
            input_quantities: activity.input_product_lots.clone(),
            input_product_lots: inputs,
        }
    }
}

impl ProductTraceability {
    pub fn raw_material(lot: ProductLot) -> Self {
        Self {
            lot,
            activity: None,
        }
    }

    pub fn is_raw_material(&self) -> bool {
        self.activity.is_none()
    }

    /// Direct input subtrees (empty for raw material).
    pub fn inputs(&self) -> &[ProductTraceability] {
        self.activity
            .as_ref()
            .map(|a| a.input_product_lots.as_slice())
            .unwrap_or(&[])
    }

    /// Number of lot levels, 1 for raw material.
    pub fn depth(&self) -> usize {
        1 + self.inputs().iter().map(|n| n.depth()).max().unwrap_or(0)
    }

    /// Lot ids in pre-order. Shared ancestors appear once per path.
    pub fn lot_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.push(node.lot.id.as_str());
            stack.extend(node.inputs().iter().rev());
        }
        ids
    }
}
