//! Generic JSON sub-parser: the fallback dispatch target when a JSON object
//! matches neither the metric nor the ECS predicate.

use serde_json::{Map, Value};

use crate::event::{NormalizedEvent, FORMAT_JSON};

use super::aliases::{
    copy_unmapped, extract_operation, extract_status_code, first_string, first_string_lower,
    DST_SERVICE_KEYS, LEVEL_KEYS, SPAN_ID_KEYS, SRC_SERVICE_KEYS, TRACE_ID_KEYS,
};
use super::time_coerce::{extract_latency, extract_timestamp};

/// Keys consumed by this parser's own field mapping; everything else in
/// `raw` is copied verbatim onto the `NormalizedEvent.raw` map.
const KNOWN_KEYS: &[&str] = &[
    "ts", "time", "@timestamp", "timestamp", "datetime", "level", "severity", "lvl", "log_level",
    "src_service", "service", "service_name", "app", "application", "component", "source",
    "dst_service", "upstream", "target", "remote_service", "peer.service", "destination",
    "trace_id", "traceId", "trace.id", "X-Trace-Id", "x-trace-id", "span_id", "spanId", "span.id",
    "operation", "event", "rpc.method", "method", "http.method", "url", "path", "uri",
    "http.url", "http.path", "status_code", "status", "http.status", "code", "http_status",
    "latency", "duration", "elapsed", "response_time", "latency_ms", "duration_ms",
    "elapsed_ms", "latency_s", "duration_s", "request_time", "message", "msg",
];

pub fn parse(raw: &Map<String, Value>, source_tag: &str) -> NormalizedEvent {
    let mut event = NormalizedEvent::new(FORMAT_JSON, source_tag);

    event.timestamp = extract_timestamp(raw).unwrap_or_else(chrono::Utc::now);
    event.level = first_string_lower(raw, LEVEL_KEYS).unwrap_or_default();
    event.src_service = first_string(raw, SRC_SERVICE_KEYS).unwrap_or_default();
    event.dst_service = first_string(raw, DST_SERVICE_KEYS).unwrap_or_default();
    event.trace_id = first_string(raw, TRACE_ID_KEYS).unwrap_or_default();
    event.span_id = first_string(raw, SPAN_ID_KEYS).unwrap_or_default();
    event.operation = extract_operation(raw);
    event.status_code = extract_status_code(raw);
    event.set_latency(extract_latency(raw));

    if let Some(msg) = first_string(raw, &["message", "msg"]) {
        event.raw.insert("message".to_string(), Value::String(msg));
    }

    for (k, v) in copy_unmapped(raw, KNOWN_KEYS) {
        event.raw.insert(k, v);
    }

    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generic_json_scenario() {
        let raw = json!({
            "ts": "2024-01-02T15:04:05Z",
            "level": "INFO",
            "service": "svc",
            "message": "hello",
            "duration_ms": 145
        })
        .as_object()
        .unwrap()
        .clone();

        let event = parse(&raw, "stdin");
        assert_eq!(event.timestamp.to_rfc3339(), "2024-01-02T15:04:05+00:00");
        assert_eq!(event.level, "info");
        assert_eq!(event.src_service, "svc");
        assert_eq!(event.latency().as_millis(), 145);
        assert_eq!(event.format, FORMAT_JSON);
        assert_eq!(
            event.raw.get("message").and_then(|v| v.as_str()),
            Some("hello")
        );
    }

    #[test]
    fn unmapped_fields_preserved() {
        let raw = json!({"service": "svc", "custom_field": "value", "nested": {"a": 1}})
            .as_object()
            .unwrap()
            .clone();
        let event = parse(&raw, "stdin");
        assert_eq!(event.raw.get("custom_field").unwrap(), "value");
        assert!(event.raw.contains_key("nested"));
    }
}
