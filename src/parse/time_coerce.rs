//! Numeric coercion rules for `timestamp` and `latency`, shared by every
//! JSON-flavored sub-parser (generic, ECS, metric).

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use super::aliases::{LATENCY_KEYS, TIMESTAMP_KEYS};

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9.]+)\s*(ms|s|µs|us|ns)?$").unwrap());

const TIMESTAMP_STRING_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S"];

/// `ts`/`time`/`@timestamp`/`timestamp`/`datetime`, in order. Strings tried
/// as RFC 3339 (with and without sub-second precision) then the two layouts
/// above; numbers `> 1e12` are Unix milliseconds, else Unix seconds.
pub fn extract_timestamp(raw: &Map<String, Value>) -> Option<DateTime<Utc>> {
    for key in TIMESTAMP_KEYS {
        let Some(value) = raw.get(*key) else { continue };
        match value {
            Value::String(s) => {
                if let Some(ts) = parse_timestamp_str(s) {
                    return Some(ts);
                }
            }
            Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    return Some(unix_to_utc(f));
                }
            }
            _ => {}
        }
    }
    None
}

pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in TIMESTAMP_STRING_LAYOUTS {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

pub fn unix_to_utc(value: f64) -> DateTime<Utc> {
    if value > 1e12 {
        Utc.timestamp_millis_opt(value as i64)
            .single()
            .unwrap_or_else(Utc::now)
    } else {
        Utc.timestamp_opt(value as i64, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Latency extraction over the generic alias list: numeric values ending in
/// `_s` are seconds, otherwise milliseconds; string values match
/// `^([0-9.]+)\s*(ms|s|µs|us|ns)?$` with the matching unit (absent → ms).
pub fn extract_latency(raw: &Map<String, Value>) -> std::time::Duration {
    for key in LATENCY_KEYS {
        let Some(value) = raw.get(*key) else { continue };
        match value {
            Value::Number(n) => {
                let Some(v) = n.as_f64() else { continue };
                let nanos = if key.ends_with("_s") {
                    v * 1_000_000_000.0
                } else {
                    v * 1_000_000.0
                };
                return std::time::Duration::from_nanos(nanos.max(0.0) as u64);
            }
            Value::String(s) => {
                if let Some(d) = parse_duration_str(s) {
                    return d;
                }
            }
            _ => {}
        }
    }
    std::time::Duration::ZERO
}

pub fn parse_duration_str(s: &str) -> Option<std::time::Duration> {
    let caps = DURATION_RE.captures(s.trim())?;
    let n: f64 = caps.get(1)?.as_str().parse().ok()?;
    let nanos = match caps.get(2).map(|m| m.as_str()) {
        Some("s") => n * 1_000_000_000.0,
        Some("µs") | Some("us") => n * 1_000.0,
        Some("ns") => n,
        _ => n * 1_000_000.0,
    };
    Some(std::time::Duration::from_nanos(nanos.max(0.0) as u64))
}
