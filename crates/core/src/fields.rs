use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::canonical::canonical_json;

/// One field group of an event: a string-keyed tree of JSON values.
///
/// A `null` group in a fixture decodes as an empty group, so `null` and `{}`
/// are interchangeable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Insert a top-level key without interpreting dots.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Insert at a dotted path (`"labels.job"`), creating intermediate
    /// objects. A non-object value sitting on the path is replaced.
    pub fn put(&mut self, path: &str, value: Value) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some((last, parents)) if !parents.is_empty() => (*last, parents),
            _ => return self.insert(path, value),
        };

        let mut slot = self
            .0
            .entry(parents[0].to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        for segment in &parents[1..] {
            slot = child_object(slot).entry(segment.to_string()).or_insert(Value::Null);
        }
        child_object(slot).insert(last.to_string(), value)
    }

    /// Look up a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Canonical string for this group, the unit of event equality.
    pub fn canonical(&self) -> String {
        canonical_json(&self.to_value())
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Coerce `slot` into an object and return its map.
fn child_object(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just made an object"),
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
        Ok(Self(map.unwrap_or_default()))
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_creates_nested_objects() {
        let mut f = Fields::new();
        f.put("labels.job", json!("node"));
        f.put("labels.instance", json!("localhost:9100"));
        f.put("up", json!(1));
        assert_eq!(
            f.to_value(),
            json!({"labels": {"job": "node", "instance": "localhost:9100"}, "up": 1})
        );
    }

    #[test]
    fn put_replaces_scalar_on_path() {
        let mut f = Fields::new();
        f.put("a", json!(5));
        f.put("a.b.c", json!(true));
        assert_eq!(f.get("a.b.c"), Some(&json!(true)));
    }

    #[test]
    fn put_returns_previous_leaf() {
        let mut f = Fields::new();
        assert_eq!(f.put("x.y", json!(1)), None);
        assert_eq!(f.put("x.y", json!(2)), Some(json!(1)));
    }

    #[test]
    fn get_missing_path() {
        let mut f = Fields::new();
        f.put("a.b", json!(1));
        assert_eq!(f.get("a.c"), None);
        assert_eq!(f.get("a.b.c"), None);
        assert_eq!(f.get("z"), None);
    }

    #[test]
    fn null_decodes_as_empty() {
        let f: Fields = serde_json::from_str("null").unwrap();
        assert!(f.is_empty());
        assert_eq!(f.canonical(), "{}");
    }

    #[test]
    fn canonical_ignores_insertion_order() {
        let a: Fields = [("b", json!(1)), ("a", json!({"y": 2, "x": 1}))].into_iter().collect();
        let b: Fields = serde_json::from_str(r#"{"a": {"x": 1, "y": 2.0}, "b": 1.0}"#).unwrap();
        assert_eq!(a.canonical(), b.canonical());
    }
}
