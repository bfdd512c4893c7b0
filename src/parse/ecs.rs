//! ECS (Elastic Common Schema) nested-JSON sub-parser. Field paths mirror
//! the ECS convention of dotted namespaces expressed as nested objects
//! (`service.name`, `http.request.method`, …), with one flat-key fallback
//! for `log.level` some shippers emit un-nested.

use serde_json::{Map, Value};

use crate::event::{NormalizedEvent, FORMAT_ECS};

use super::aliases::copy_unmapped;

/// Top-level keys consumed by this parser's own field mapping; everything
/// else in `raw` is copied verbatim onto `NormalizedEvent.raw`, same as the
/// generic JSON and template sub-parsers.
const KNOWN_KEYS: &[&str] = &[
    "@timestamp",
    "ecs.version",
    "log.level",
    "log",
    "service",
    "trace",
    "span",
    "http",
    "url",
    "event",
    "destination",
    "server",
];

/// metric/ecs/json dispatch predicate: any of `@timestamp`, `ecs.version`,
/// `log.level` (flat key) exists, or `log` is an object containing `level`.
pub fn is_ecs(raw: &Map<String, Value>) -> bool {
    raw.contains_key("@timestamp")
        || raw.contains_key("ecs.version")
        || raw.contains_key("log.level")
        || nested_str(raw, "log", "level").is_some()
}

pub fn parse(raw: &Map<String, Value>, source_tag: &str) -> NormalizedEvent {
    let mut event = NormalizedEvent::new(FORMAT_ECS, source_tag);

    event.timestamp = raw
        .get("@timestamp")
        .and_then(Value::as_str)
        .and_then(super::time_coerce::parse_timestamp_str)
        .unwrap_or_else(chrono::Utc::now);

    event.level = nested_str(raw, "log", "level")
        .or_else(|| raw.get("log.level").and_then(Value::as_str).map(str::to_string))
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    event.src_service = nested_str(raw, "service", "name").unwrap_or_default();
    event.trace_id = nested_str(raw, "trace", "id").unwrap_or_default();
    event.span_id = nested_str(raw, "span", "id").unwrap_or_default();

    event.status_code = nested_path_i64(raw, &["http", "response", "status_code"]).unwrap_or(0);

    if let Some(ns) = nested_path_f64(raw, &["event", "duration"]) {
        event.set_latency(std::time::Duration::from_nanos(ns.max(0.0) as u64));
    }

    let method = nested_path_str(raw, &["http", "request", "method"]);
    let url_path = nested_path_str(raw, &["url", "path"])
        .or_else(|| nested_path_str(raw, &["url", "full"]));
    event.operation = match (method, url_path) {
        (Some(m), Some(u)) => format!("{} {}", m.to_uppercase(), u),
        (Some(m), None) => m.to_uppercase(),
        (None, Some(u)) => u,
        (None, None) => String::new(),
    };

    event.dst_service = nested_str(raw, "destination", "address")
        .or_else(|| nested_str(raw, "server", "address"))
        .unwrap_or_default();

    for (k, v) in copy_unmapped(raw, KNOWN_KEYS) {
        event.raw.insert(k, v);
    }

    event
}

fn nested_str(raw: &Map<String, Value>, obj_key: &str, field: &str) -> Option<String> {
    raw.get(obj_key)
        .and_then(Value::as_object)
        .and_then(|o| o.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn nested_path_str(raw: &Map<String, Value>, path: &[&str]) -> Option<String> {
    let mut current = raw.get(*path.first()?)?;
    for key in &path[1..] {
        current = current.as_object()?.get(*key)?;
    }
    current.as_str().map(str::to_string)
}

fn nested_path_i64(raw: &Map<String, Value>, path: &[&str]) -> Option<i64> {
    let mut current = raw.get(*path.first()?)?;
    for key in &path[1..] {
        current = current.as_object()?.get(*key)?;
    }
    current.as_i64().or_else(|| current.as_f64().map(|f| f as i64))
}

fn nested_path_f64(raw: &Map<String, Value>, path: &[&str]) -> Option<f64> {
    let mut current = raw.get(*path.first()?)?;
    for key in &path[1..] {
        current = current.as_object()?.get(*key)?;
    }
    current.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ecs_scenario() {
        let raw = json!({
            "@timestamp": "2024-02-10T13:55:36.123Z",
            "log": {"level": "warn"},
            "service": {"name": "api-gw"},
            "trace": {"id": "t1"},
            "http": {"request": {"method": "POST"}, "response": {"status_code": 401}},
            "url": {"path": "/login"},
            "event": {"duration": 234000000},
            "destination": {"address": "auth"}
        })
        .as_object()
        .unwrap()
        .clone();

        assert!(is_ecs(&raw));
        let event = parse(&raw, "stdin");
        assert_eq!(event.format, FORMAT_ECS);
        assert_eq!(event.src_service, "api-gw");
        assert_eq!(event.trace_id, "t1");
        assert_eq!(event.status_code, 401);
        assert_eq!(event.latency().as_millis(), 234);
        assert_eq!(event.operation, "POST /login");
        assert_eq!(event.dst_service, "auth");
        assert_eq!(event.level, "warn");
    }

    #[test]
    fn is_ecs_detects_flat_log_level_key() {
        let mut raw = Map::new();
        raw.insert("log.level".to_string(), Value::String("error".to_string()));
        assert!(is_ecs(&raw));
    }

    #[test]
    fn is_ecs_false_for_generic_json() {
        let raw = json!({"service": "svc", "message": "hi"}).as_object().unwrap().clone();
        assert!(!is_ecs(&raw));
    }

    #[test]
    fn unmapped_fields_preserved_flat() {
        let raw = json!({
            "@timestamp": "2024-02-10T13:55:36.123Z",
            "service": {"name": "api-gw"},
            "message": "request handled",
            "labels": {"env": "prod"}
        })
        .as_object()
        .unwrap()
        .clone();

        let event = parse(&raw, "stdin");
        assert_eq!(
            event.raw.get("message").and_then(Value::as_str),
            Some("request handled")
        );
        assert!(event.raw.contains_key("labels"));
        assert!(!event.raw.contains_key("ecs"));
        assert!(!event.raw.contains_key("service"));
    }
}
