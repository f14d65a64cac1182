use std::collections::BTreeMap;

use serde_json::Value;

/// Selector is an equality filter over the top-level fields of a JSON
/// document, in the spirit of a CouchDB `{"selector": {...}}` query:
///
/// ```text
/// {"selector": {"docType": "productLot", "referenceNumber": "R1"}}
/// ```
///
/// A document matches when every selector field is present and equal.
/// Values that are not JSON objects never match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    fields: BTreeMap<String, Value>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition on `field`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Check whether the encoded document satisfies every condition.
    pub fn matches(&self, doc: &[u8]) -> bool {
        let Ok(Value::Object(obj)) = serde_json::from_slice::<Value>(doc) else {
            return false;
        };
        self.fields
            .iter()
            .all(|(field, expected)| obj.get(field) == Some(expected))
    }

    /// Render the selector as a query string, used for logging.
    pub fn to_query_string(&self) -> String {
        let selector: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::json!({ "selector": selector }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_all_fields() {
        let sel = Selector::new()
            .eq("docType", "productLot")
            .eq("referenceNumber", "R1");
        assert!(sel.matches(br#"{"docType":"productLot","referenceNumber":"R1","x":1}"#));
        assert!(!sel.matches(br#"{"docType":"productLot","referenceNumber":"R2"}"#));
        assert!(!sel.matches(br#"{"docType":"activity","referenceNumber":"R1"}"#));
        assert!(!sel.matches(br#"{"docType":"productLot"}"#));
    }

    #[test]
    fn non_object_never_matches() {
        let sel = Selector::new();
        assert!(sel.matches(b"{}"));
        assert!(!sel.matches(b"not json"));
        assert!(!sel.matches(b"[1,2]"));
    }

    #[test]
    fn typed_values_compare_strictly() {
        let sel = Selector::new().eq("isSerialNumber", true);
        assert!(sel.matches(br#"{"isSerialNumber":true}"#));
        assert!(!sel.matches(br#"{"isSerialNumber":"true"}"#));
    }

    #[test]
    fn query_string_format() {
        let sel = Selector::new().eq("docType", "activity");
        assert_eq!(sel.to_query_string(), r#"{"selector":{"docType":"activity"}}"#);
    }
}
