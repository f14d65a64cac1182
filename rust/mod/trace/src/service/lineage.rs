use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracelot_core::ServiceError;
use tracing::debug;

use crate::model::{Activity, ActivityTraceability, ProductLot, ProductTraceability};

use super::TraceService;

enum Step {
    /// Visit a lot: resolve it and schedule its inputs.
    Enter(String),
    /// All inputs of this lot are built; build its node.
    Exit(ProductLot),
}

impl TraceService {
    // ── Lineage ──

    /// Rebuild the full ancestry of the lot with this reference number.
    pub fn trace_by_reference_number(
        &self,
        reference_number: &str,
    ) -> Result<ProductTraceability, ServiceError> {
        let start = self.read_product_lot_by_reference_number(reference_number)?;
        self.trace_from(start)
    }

    /// Rebuild the full ancestry of the lot with this id.
    pub fn trace_product(&self, id: &str) -> Result<ProductTraceability, ServiceError> {
        let start = self.read_product_lot(id)?;
        self.trace_from(start)
    }

    /// Activities keyed by the lot they produced.
    fn producer_index(&self) -> Result<HashMap<String, Activity>, ServiceError> {
        let mut index = HashMap::new();
        for activity in self.query.scan_all::<Activity>()? {
            match index.entry(activity.output_product_lot.id.clone()) {
                Entry::Occupied(existing) => {
                    let other: &Activity = existing.get();
                    return Err(ServiceError::Ambiguous(format!(
                        "product lot '{}' is the output of both activity '{}' and activity '{}'",
                        existing.key(),
                        other.id,
                        activity.id
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(activity);
                }
            }
        }
        Ok(index)
    }

    /// Post-order walk over the consumption graph with an explicit stack.
    ///
    /// `on_path` holds the lots entered but not yet exited; meeting one of
    /// them again means the graph loops. `built` memoizes finished subtrees
    /// so a shared ancestor is resolved once and cloned into each position.
    fn trace_from(&self, start: ProductLot) -> Result<ProductTraceability, ServiceError> {
        let producers = self.producer_index()?;
        let root_id = start.id.clone();

        let mut pending: HashMap<String, ProductLot> = HashMap::new();
        pending.insert(start.id.clone(), start);
        let mut built: HashMap<String, ProductTraceability> = HashMap::new();
        let mut on_path: HashSet<String> = HashSet::new();
        let mut stack = vec![Step::Enter(root_id.clone())];

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    if built.contains_key(&id) {
                        continue;
                    }
                    if on_path.contains(&id) {
                        return Err(ServiceError::CycleDetected(format!(
                            "product lot '{}' appears in its own lineage",
                            id
                        )));
                    }

                    let lot = match pending.remove(&id) {
                        Some(lot) => lot,
                        None => self.lots.get(&id)?.ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "input product lot '{}' referenced in the lineage does not exist",
                                id
                            ))
                        })?,
                    };

                    on_path.insert(id.clone());
                    stack.push(Step::Exit(lot));
                    if let Some(activity) = producers.get(&id) {
                        // Reversed so inputs are entered in id order.
                        for input in activity.input_product_lots.keys().rev() {
                            stack.push(Step::Enter(input.clone()));
                        }
                    }
                }
                Step::Exit(lot) => {
                    on_path.remove(&lot.id);
                    let node = match producers.get(&lot.id) {
                        Some(activity) => {
                            let inputs = activity
                                .input_product_lots
                                .keys()
                                .map(|input| {
                                    built.get(input).cloned().ok_or_else(|| {
                                        ServiceError::Internal(format!(
                                            "lineage of '{}' is missing input '{}'",
                                            lot.id, input
                                        ))
                                    })
                                })
                                .collect::<Result<Vec<_>, _>>()?;
                            ProductTraceability {
                                lot,
                                activity: Some(ActivityTraceability::new(activity, inputs)),
                            }
                        }
                        None => ProductTraceability::raw_material(lot),
                    };
                    built.insert(node.lot.id.clone(), node);
                }
            }
        }

        debug!("traced {}: {} distinct lot(s)", root_id, built.len());
        built.remove(&root_id).ok_or_else(|| {
            ServiceError::Internal(format!("lineage walk did not build '{}'", root_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use tracelot_kv::KVStore;

    use super::super::testing::{new_lot, service};
    use super::*;
    use crate::model::NewActivity;
    use crate::store::RecordStore;

    fn activity(id: &str, inputs: &[(&str, f64)], output: &str, reference: &str) -> NewActivity {
        NewActivity {
            id: id.into(),
            designation: format!("{id} designation"),
            user_id: "operator-1".into(),
            input_product_lots: inputs
                .iter()
                .map(|(lot, qty)| (lot.to_string(), *qty))
                .collect(),
            output_product_lot: new_lot(output, reference, 1.0),
        }
    }

    /// Write an activity record without going through the processor.
    fn put_activity(
        kv: &Arc<dyn KVStore>,
        svc: &TraceService,
        id: &str,
        inputs: &[(&str, f64)],
        output: &str,
    ) {
        let record = Activity {
            id: id.into(),
            designation: String::new(),
            user_id: "u".into(),
            date_time: "2026-01-01T00:00:00+00:00".into(),
            input_product_lots: inputs
                .iter()
                .map(|(lot, qty)| (lot.to_string(), *qty))
                .collect::<BTreeMap<_, _>>(),
            output_product_lot: svc.read_product_lot(output).unwrap(),
        };
        let bytes = RecordStore::<Activity>::encode(&record).unwrap();
        kv.set(&RecordStore::<Activity>::key(id), &bytes).unwrap();
    }

    #[test]
    fn raw_material_is_a_leaf() {
        let (svc, _kv, _dir) = service();
        svc.create_product_lot(new_lot("steel-1", "R1", 100.0)).unwrap();

        let tree = svc.trace_by_reference_number("R1").unwrap();
        assert!(tree.is_raw_material());
        assert_eq!(tree.lot.id, "steel-1");
        assert!(tree.inputs().is_empty());
    }

    #[test]
    fn single_transformation() {
        let (svc, _kv, _dir) = service();
        svc.create_product_lot(new_lot("steel-1", "R1", 100.0)).unwrap();
        svc.create_activity(activity("cut-1", &[("steel-1", 40.0)], "plate-1", "R2"))
            .unwrap();

        let tree = svc.trace_by_reference_number("R2").unwrap();
        assert_eq!(tree.lot.id, "plate-1");
        let act = tree.activity.as_ref().unwrap();
        assert_eq!(act.id, "cut-1");
        assert_eq!(act.input_quantities.get("steel-1"), Some(&40.0));
        assert_eq!(act.input_product_lots.len(), 1);

        let input = &act.input_product_lots[0];
        assert_eq!(input.lot.id, "steel-1");
        assert_eq!(input.lot.available_quantity, 60.0);
        assert!(input.is_raw_material());
    }

    #[test]
    fn multi_level_chain() {
        let (svc, _kv, _dir) = service();
        svc.create_product_lot(new_lot("ore", "R0", 1000.0)).unwrap();
        svc.create_activity(activity("smelt", &[("ore", 500.0)], "steel", "R1")).unwrap();
        svc.create_activity(activity("cut", &[("steel", 1.0)], "plate", "R2")).unwrap();
        svc.create_activity(activity("bend", &[("plate", 1.0)], "bracket", "R3")).unwrap();

        let tree = svc.trace_product("bracket").unwrap();
        assert_eq!(tree.depth(), 4);
        assert_eq!(tree.lot_ids(), vec!["bracket", "plate", "steel", "ore"]);
        assert_eq!(svc.trace_by_reference_number("R3").unwrap(), tree);
    }

    #[test]
    fn shared_ancestor_is_expanded_in_each_branch() {
        let (svc, _kv, _dir) = service();
        svc.create_product_lot(new_lot("steel", "R0", 100.0)).unwrap();
        svc.create_activity(activity("cut-a", &[("steel", 10.0)], "left", "R1")).unwrap();
        svc.create_activity(activity("cut-b", &[("steel", 20.0)], "right", "R2")).unwrap();
        svc.create_activity(activity("weld", &[("left", 1.0), ("right", 1.0)], "frame", "R3"))
            .unwrap();

        let tree = svc.trace_product("frame").unwrap();
        assert_eq!(tree.lot_ids(), vec!["frame", "left", "steel", "right", "steel"]);
        assert_eq!(tree.depth(), 3);

        let left = &tree.inputs()[0].inputs()[0];
        let right = &tree.inputs()[1].inputs()[0];
        assert_eq!(left, right);
        assert_eq!(left.lot.available_quantity, 70.0);
    }

    #[test]
    fn unknown_reference_is_not_found() {
        let (svc, _kv, _dir) = service();
        assert!(matches!(
            svc.trace_by_reference_number("R404"),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(svc.trace_product("ghost"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn cycle_is_detected() {
        let (svc, kv, _dir) = service();
        svc.create_product_lot(new_lot("a", "R1", 10.0)).unwrap();
        svc.create_product_lot(new_lot("b", "R2", 10.0)).unwrap();
        put_activity(&kv, &svc, "x", &[("b", 1.0)], "a");
        put_activity(&kv, &svc, "y", &[("a", 1.0)], "b");

        let err = svc.trace_product("a").unwrap_err();
        assert!(matches!(err, ServiceError::CycleDetected(_)), "got {err:?}");
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn self_consuming_lot_is_a_cycle() {
        let (svc, kv, _dir) = service();
        svc.create_product_lot(new_lot("a", "R1", 10.0)).unwrap();
        put_activity(&kv, &svc, "x", &[("a", 1.0)], "a");

        let err = svc.trace_by_reference_number("R1").unwrap_err();
        assert!(matches!(err, ServiceError::CycleDetected(_)));
    }

    #[test]
    fn two_producers_are_ambiguous() {
        let (svc, kv, _dir) = service();
        svc.create_product_lot(new_lot("a", "R1", 10.0)).unwrap();
        svc.create_product_lot(new_lot("b", "R2", 10.0)).unwrap();
        put_activity(&kv, &svc, "x", &[("a", 1.0)], "b");
        put_activity(&kv, &svc, "y", &[("a", 2.0)], "b");

        let err = svc.trace_product("b").unwrap_err();
        assert!(matches!(err, ServiceError::Ambiguous(_)), "got {err:?}");
    }

    #[test]
    fn vanished_input_is_not_found() {
        let (svc, kv, _dir) = service();
        svc.create_product_lot(new_lot("steel-1", "R1", 100.0)).unwrap();
        svc.create_activity(activity("cut-1", &[("steel-1", 40.0)], "plate-1", "R2"))
            .unwrap();
        kv.delete(&RecordStore::<ProductLot>::key("steel-1")).unwrap();

        let err = svc.trace_by_reference_number("R2").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
        assert!(err.to_string().contains("steel-1"));
    }
}
