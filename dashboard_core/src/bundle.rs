use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Decoded files of one metric type, keyed by file key.
///
/// Bundles are immutable snapshots; clones share the same allocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricBundle {
    files: Arc<BTreeMap<String, Value>>,
}

impl MetricBundle {
    pub fn new(files: BTreeMap<String, Value>) -> Self {
        Self {
            files: Arc::new(files),
        }
    }

    pub fn get(&self, file_key: &str) -> Option<&Value> {
        self.files.get(file_key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.files
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// True when both handles point at the same cached snapshot.
    pub fn ptr_eq(&self, other: &MetricBundle) -> bool {
        Arc::ptr_eq(&self.files, &other.files)
    }
}

impl FromIterator<(String, Value)> for MetricBundle {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bundle_serializes_as_object() {
        let bundle: MetricBundle = vec![
            ("a".to_string(), json!({"x": 1})),
            ("b".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            serde_json::to_value(&bundle).unwrap(),
            json!({"a": {"x": 1}, "b": null})
        );
        assert_eq!(bundle.to_json(), json!({"a": {"x": 1}, "b": null}));
    }

    #[test]
    fn test_bundle_deserializes_from_object() {
        let bundle: MetricBundle =
            serde_json::from_value(json!({"a": [1, 2], "b": null})).unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.get("a"), Some(&json!([1, 2])));
        assert_eq!(bundle.get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_clones_share_snapshot() {
        let bundle = MetricBundle::new(BTreeMap::new());
        let clone = bundle.clone();
        assert!(bundle.ptr_eq(&clone));
        assert!(!bundle.ptr_eq(&MetricBundle::default()));
    }
}
