//! `prometheus/collector`: one event per distinct label set.
//!
//! Samples sharing a label set are folded into a single event:
//!
//! ```json
//! {
//!   "module_fields":    { "labels": { "job": "node" } },
//!   "metricset_fields": { "metrics": { "up": 1, "scrape_duration_seconds": 0.02 } }
//! }
//! ```
//!
//! NaN and ±Inf samples carry no JSON representation and are dropped.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use url::Url;

use mbgolden_core::Event;

use super::parse::{parse_text, Sample};
use super::MODULE;
use crate::error::FetchError;
use crate::http::{host_url, HttpClient};
use crate::metricset::{HostContext, MetricSet};
use crate::reporter::CapturingReporter;

pub const METRICSET: &str = "collector";

pub struct Collector {
    client: HttpClient,
    url: Url,
}

/// Registry factory.
pub fn factory(ctx: &HostContext<'_>) -> Result<Box<dyn MetricSet>, FetchError> {
    let url = host_url(ctx.host, &ctx.config.metrics_path)?;
    let client = HttpClient::new(ctx.config.timeout())?;
    Ok(Box::new(Collector { client, url }))
}

impl MetricSet for Collector {
    fn fetch(&self, reporter: &mut CapturingReporter) {
        let body = match self.client.get(&self.url) {
            Ok(body) => body,
            Err(e) => {
                reporter.error(e);
                return;
            }
        };

        let (samples, line_errors) = parse_text(&body.text());
        for err in line_errors {
            reporter.error(FetchError::Parse {
                line: err.line,
                message: err.message,
            });
        }

        let (events, fold_errors) = fold_samples(samples);
        for err in fold_errors {
            reporter.error(err);
        }
        for event in events {
            reporter.event(event);
        }
    }
}

#[derive(Default)]
struct Group {
    metrics: Map<String, Value>,
    latest_ms: Option<i64>,
}

/// Group samples by label set, first-seen label sets first.
pub fn fold_samples(samples: Vec<Sample>) -> (Vec<Event>, Vec<FetchError>) {
    let mut order: Vec<BTreeMap<String, String>> = Vec::new();
    let mut groups: BTreeMap<BTreeMap<String, String>, Group> = BTreeMap::new();
    let mut errors = Vec::new();

    for sample in samples {
        let Some(number) = Number::from_f64(sample.value) else {
            continue;
        };

        if !groups.contains_key(&sample.labels) {
            order.push(sample.labels.clone());
        }
        let group = groups.entry(sample.labels).or_default();

        if group.metrics.contains_key(&sample.name) {
            errors.push(FetchError::Sample(format!(
                "duplicate sample for metric '{}'",
                sample.name
            )));
            continue;
        }
        group.metrics.insert(sample.name, Value::Number(number));
        if let Some(ts) = sample.timestamp_ms {
            group.latest_ms = Some(group.latest_ms.map_or(ts, |cur| cur.max(ts)));
        }
    }

    let events = order
        .into_iter()
        .filter_map(|labels| {
            let group = groups.remove(&labels)?;
            Some(build_event(labels, group))
        })
        .collect();

    (events, errors)
}

fn build_event(labels: BTreeMap<String, String>, group: Group) -> Event {
    let mut event = Event::new().with_namespace(format!("{MODULE}.{METRICSET}"));
    if !labels.is_empty() {
        let labels: Map<String, Value> = labels
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        event.module_fields.insert("labels", Value::Object(labels));
    }
    event.metricset_fields.insert("metrics", Value::Object(group.metrics));
    event.timestamp = group.latest_ms.and_then(DateTime::<Utc>::from_timestamp_millis);
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prometheus::parse::parse_line;
    use serde_json::json;

    fn samples(lines: &[&str]) -> Vec<Sample> {
        lines
            .iter()
            .map(|l| parse_line(l).unwrap().unwrap())
            .collect()
    }

    #[test]
    fn groups_by_label_set() {
        let (events, errors) = fold_samples(samples(&[
            r#"up{job="node"} 1"#,
            r#"scrape_duration_seconds{job="node"} 0.02"#,
            r#"up{job="db"} 0"#,
            "process_open_fds 12",
        ]));
        assert!(errors.is_empty());
        assert_eq!(events.len(), 3);

        assert_eq!(events[0].module_fields.get("labels.job"), Some(&json!("node")));
        assert_eq!(
            events[0].metricset_fields.get("metrics"),
            Some(&json!({"up": 1.0, "scrape_duration_seconds": 0.02}))
        );
        assert_eq!(events[1].module_fields.get("labels.job"), Some(&json!("db")));
        assert!(events[2].module_fields.is_empty());
        assert_eq!(events[2].metricset_fields.get("metrics.process_open_fds"), Some(&json!(12.0)));
    }

    #[test]
    fn non_finite_samples_dropped() {
        let (events, errors) = fold_samples(samples(&["a NaN", "b +Inf", "c 3"]));
        assert!(errors.is_empty());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metricset_fields.get("metrics"), Some(&json!({"c": 3.0})));
    }

    #[test]
    fn only_non_finite_yields_no_event() {
        let (events, _) = fold_samples(samples(&[r#"a{x="1"} NaN"#]));
        assert!(events.is_empty());
    }

    #[test]
    fn duplicate_sample_is_an_error() {
        let (events, errors) = fold_samples(samples(&["up 1", "up 0"]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metricset_fields.get("metrics.up"), Some(&json!(1.0)));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn latest_timestamp_kept() {
        let (events, _) = fold_samples(samples(&["a 1 1000", "b 2 3000", "c 3 2000"]));
        let ts = events[0].timestamp.unwrap();
        assert_eq!(ts.timestamp_millis(), 3000);
    }

    #[test]
    fn recording_rule_names_kept_verbatim() {
        let (events, _) = fold_samples(samples(&["job:rate5m 4"]));
        assert_eq!(
            events[0].metricset_fields.get("metrics"),
            Some(&json!({"job:rate5m": 4.0}))
        );
    }

    #[test]
    fn namespace_is_set() {
        let (events, _) = fold_samples(samples(&["up 1"]));
        assert_eq!(events[0].namespace.as_deref(), Some("prometheus.collector"));
    }
}
