//! Format sniffing, multi-dialect structured parsing, and the compiled
//! template parser — the engine that turns a raw line into a
//! [`NormalizedEvent`].
//!
//! Dispatch order is deterministic and load-bearing: a JSON object that
//! satisfies both the metric and ECS predicates is classified as a metric
//! (`metric` before `ecs` before generic `json`, see [`dispatch`]).

pub mod aliases;
pub mod ecs;
pub mod json;
pub mod metric;
pub mod template;
pub mod time_coerce;

use crate::event::{NormalizedEvent, FORMAT_EMPTY, FORMAT_PLAIN};

/// Parses `(line, source_tag)` into a `NormalizedEvent` per the dispatcher
/// rules in the component design. Never fails: an unparseable or empty line
/// degrades to the plain/empty branch rather than returning an error.
pub fn dispatch(line: &str, source_tag: &str) -> NormalizedEvent {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return NormalizedEvent::new(FORMAT_EMPTY, source_tag);
    }

    let first = trimmed.as_bytes()[0];
    if first != b'{' && first != b'[' {
        return plain(trimmed, source_tag);
    }

    let parsed: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return plain(trimmed, source_tag),
    };

    let Some(obj) = parsed.as_object() else {
        return plain(trimmed, source_tag);
    };

    let event = if metric::is_metric(obj) {
        metric::parse(obj, source_tag)
    } else if ecs::is_ecs(obj) {
        ecs::parse(obj, source_tag)
    } else {
        json::parse(obj, source_tag)
    };

    warn_if_unattributed(&event);
    event
}

fn plain(line: &str, source_tag: &str) -> NormalizedEvent {
    let mut event = NormalizedEvent::new(FORMAT_PLAIN, source_tag);
    event
        .raw
        .insert("message".to_string(), serde_json::Value::String(line.to_string()));
    event
}

/// `src_service == ""` after parsing is a soft failure: not
/// fatal, the event is still emitted, but a warning is logged so the gap is
/// visible in operation.
fn warn_if_unattributed(event: &NormalizedEvent) {
    if event.src_service.is_empty() {
        tracing::warn!(
            format = %event.format,
            source_name = %event.source_name,
            "parsed event has no src_service"
        );
    }
}
