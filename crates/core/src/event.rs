use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::Fields;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A single document reported by a metric set.
///
/// Only the three field groups take part in matching. `namespace` and
/// `timestamp` are carried through fixtures for readability but never
/// compared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub root_fields: Fields,
    #[serde(default)]
    pub module_fields: Fields,
    #[serde(default)]
    pub metricset_fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, path: &str, value: Value) -> Self {
        self.root_fields.put(path, value);
        self
    }

    pub fn with_module(mut self, path: &str, value: Value) -> Self {
        self.module_fields.put(path, value);
        self
    }

    pub fn with_metricset(mut self, path: &str, value: Value) -> Self {
        self.metricset_fields.put(path, value);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Structural identity of this event.
    pub fn key(&self) -> EventKey {
        EventKey {
            root: self.root_fields.canonical(),
            module: self.module_fields.canonical(),
            metricset: self.metricset_fields.canonical(),
        }
    }

    /// True when every field group encodes identically.
    pub fn matches(&self, other: &Event) -> bool {
        self.root_fields.canonical() == other.root_fields.canonical()
            && self.module_fields.canonical() == other.module_fields.canonical()
            && self.metricset_fields.canonical() == other.metricset_fields.canonical()
    }
}

impl fmt::Display for Event {
    /// Indented JSON, the same shape the event takes in an expected fixture.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{}", self.key()),
        }
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Canonical encodings of the three field groups, compared group by group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub root: String,
    pub module: String,
    pub metricset: String,
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "root={} module={} metricset={}",
            self.root, self.module, self.metricset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Event {
        Event::new()
            .with_module("labels.job", json!("node"))
            .with_metricset("metrics.up", json!(1.0))
    }

    #[test]
    fn key_is_groupwise() {
        let key = sample().key();
        assert_eq!(key.root, "{}");
        assert_eq!(key.module, r#"{"labels":{"job":"node"}}"#);
        assert_eq!(key.metricset, r#"{"metrics":{"up":1}}"#);
    }

    #[test]
    fn groups_are_not_interchangeable() {
        // Same content placed in a different group is a different event
        let a = Event::new().with_root("x", json!(1));
        let b = Event::new().with_module("x", json!(1));
        assert!(!a.matches(&b));
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn namespace_and_timestamp_ignored() {
        let mut other = sample().with_namespace("prometheus.collector");
        other.timestamp = Some(Utc::now());
        assert!(sample().matches(&other));
        assert_eq!(sample().key(), other.key());
    }

    #[test]
    fn decode_with_null_groups() {
        let json = r#"{
            "root_fields": null,
            "module_fields": {"labels": {"job": "node"}},
            "metricset_fields": {"metrics": {"up": 1}}
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(event.matches(&sample()));
    }

    #[test]
    fn missing_groups_default_to_empty() {
        let event: Event = serde_json::from_str("{}").unwrap();
        assert!(event.matches(&Event::new()));
    }

    #[test]
    fn optional_fields_skipped_when_absent() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("namespace"));
        assert!(!obj.contains_key("timestamp"));
        assert!(obj.contains_key("root_fields"));
    }

    #[test]
    fn display_is_pretty_json() {
        let text = sample().to_string();
        assert!(text.contains("\"metricset_fields\""));
        assert!(text.contains('\n'));
    }
}
