//! Ordered field-alias key-lists, kept as data tables so new aliases can be
//! added without touching dispatch logic (per the alias-resolution design).

use serde_json::{Map, Value};

pub const TIMESTAMP_KEYS: &[&str] = &["ts", "time", "@timestamp", "timestamp", "datetime"];
pub const LEVEL_KEYS: &[&str] = &["level", "severity", "lvl", "log_level"];
pub const SRC_SERVICE_KEYS: &[&str] = &[
    "src_service",
    "service",
    "service_name",
    "app",
    "application",
    "component",
    "source",
];
pub const DST_SERVICE_KEYS: &[&str] = &[
    "dst_service",
    "upstream",
    "target",
    "remote_service",
    "peer.service",
    "destination",
];
pub const TRACE_ID_KEYS: &[&str] = &["trace_id", "traceId", "trace.id", "X-Trace-Id", "x-trace-id"];
pub const SPAN_ID_KEYS: &[&str] = &["span_id", "spanId", "span.id"];
pub const OPERATION_KEYS: &[&str] = &["operation", "event", "rpc.method"];
pub const STATUS_CODE_KEYS: &[&str] = &["status_code", "status", "http.status", "code", "http_status"];
pub const LATENCY_KEYS: &[&str] = &[
    "latency",
    "duration",
    "elapsed",
    "response_time",
    "latency_ms",
    "duration_ms",
    "elapsed_ms",
    "latency_s",
    "duration_s",
    "request_time",
];

/// First non-empty string value found among `keys`, in order.
pub fn first_string(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(Value::String(s)) = raw.get(*key) {
            if !s.is_empty() {
                return Some(s.clone());
            }
        }
    }
    None
}

pub fn first_string_lower(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_string(raw, keys).map(|s| s.to_lowercase())
}

/// `operation`: alias list, else `"{method} {url}"`, else whichever of
/// method/url is present.
pub fn extract_operation(raw: &Map<String, Value>) -> String {
    if let Some(op) = first_string(raw, OPERATION_KEYS) {
        return op;
    }
    let method = first_string(raw, &["method", "http.method"]);
    let url = first_string(raw, &["url", "path", "uri", "http.url", "http.path"]);
    match (method, url) {
        (Some(m), Some(u)) => format!("{m} {u}"),
        (Some(m), None) => m,
        (None, Some(u)) => u,
        (None, None) => String::new(),
    }
}

/// Accept integers directly, strings by base-10 parse; invalid → 0 (absent).
pub fn extract_status_code(raw: &Map<String, Value>) -> i64 {
    for key in STATUS_CODE_KEYS {
        match raw.get(*key) {
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return i;
                }
                if let Some(f) = n.as_f64() {
                    return f as i64;
                }
            }
            Some(Value::String(s)) => {
                if let Ok(i) = s.parse::<i64>() {
                    return i;
                }
            }
            _ => {}
        }
    }
    0
}

/// Fields not consumed by the dispatcher/sub-parser's known-key set are
/// copied verbatim into `raw` on the `NormalizedEvent`.
pub fn copy_unmapped(raw: &Map<String, Value>, known_keys: &[&str]) -> Map<String, Value> {
    let mut out = Map::new();
    for (k, v) in raw {
        if !known_keys.contains(&k.as_str()) {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}
