//! Metric JSON sub-parser: a bare `{metric, value}` pair, checked before the
//! ECS predicate so a JSON object carrying both metric fields and an
//! `@timestamp` is classified as a metric (load-bearing dispatch order,
//! see `mod.rs`).

use serde_json::{Map, Value};

use crate::event::{NormalizedEvent, FORMAT_METRIC};

use super::aliases::{first_string, SRC_SERVICE_KEYS};
use super::time_coerce::extract_timestamp;

/// `metric` (string) and `value` (numeric) both present.
pub fn is_metric(raw: &Map<String, Value>) -> bool {
    matches!(raw.get("metric"), Some(Value::String(s)) if !s.is_empty())
        && matches!(raw.get("value"), Some(Value::Number(_)))
}

pub fn parse(raw: &Map<String, Value>, source_tag: &str) -> NormalizedEvent {
    let mut event = NormalizedEvent::new(FORMAT_METRIC, source_tag);

    event.timestamp = extract_timestamp(raw).unwrap_or_else(chrono::Utc::now);
    event.src_service = first_string(raw, SRC_SERVICE_KEYS).unwrap_or_default();

    let metric_name = raw.get("metric").and_then(Value::as_str).unwrap_or_default();
    event.operation = metric_name.to_string();

    if let Some(value) = raw.get("value") {
        event.raw.insert("metric_value".to_string(), value.clone());
    }

    event
}
