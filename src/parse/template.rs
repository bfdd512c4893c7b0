//! Compiled-template parser for line-oriented formats such as an
//! nginx-combined access log: a template string of literal text and
//! `$variable` placeholders compiles once into an anchored regex with named
//! captures, then matches many lines cheaply.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use thiserror::Error;

use crate::event::{NormalizedEvent, FORMAT_TEMPLATE};

static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([a-zA-Z_][a-zA-Z0-9_]*)").unwrap());

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("invalid template regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// A compiled `(anchored regex, ordered variable names)` pair.
pub struct TemplateParser {
    re: Regex,
    vars: Vec<String>,
}

impl TemplateParser {
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let mut pattern = String::from("^");
        let mut vars = Vec::new();
        let mut last = 0;

        for caps in VAR_PATTERN.captures_iter(template) {
            let whole = caps.get(0).unwrap();
            pattern.push_str(&regex::escape(&template[last..whole.start()]));
            let name = caps.get(1).unwrap().as_str();
            vars.push(name.to_string());
            pattern.push_str(&format!("(?P<{}>{})", name, capture_class(name)));
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push('$');

        let re = Regex::new(&pattern)?;
        Ok(Self { re, vars })
    }

    /// Returns the captured `variable -> value` map, or `None` on no match.
    pub fn parse(&self, line: &str) -> Option<HashMap<String, String>> {
        let caps = self.re.captures(line.trim())?;
        let mut out = HashMap::with_capacity(self.vars.len());
        for name in &self.vars {
            if let Some(m) = caps.name(name) {
                out.insert(name.clone(), m.as_str().to_string());
            }
        }
        Some(out)
    }

    /// Matches `line` and maps the captured fields onto a `NormalizedEvent`.
    /// Returns `None` (engine falls back to plain) when the line does not
    /// match the compiled template.
    pub fn parse_normalized(&self, line: &str, source_tag: &str) -> Option<NormalizedEvent> {
        let fields = self.parse(line)?;
        let mut event = NormalizedEvent::new(FORMAT_TEMPLATE, source_tag);

        map_template_fields(&mut event, &fields);

        for (k, v) in &fields {
            event
                .raw
                .insert(k.clone(), serde_json::Value::String(v.clone()));
        }

        Some(event)
    }
}

fn capture_class(name: &str) -> &'static str {
    match name {
        "time_local" => r"[^\]]+",
        "request" => r#"[^"]+"#,
        "http_user_agent" | "http_referer" => r#"[^"]*"#,
        "status" => r"\d{3}",
        "body_bytes_sent" | "bytes" => r"\d+",
        "request_time" | "upstream_response_time" => r"[\d.]+|-",
        _ => r"\S+",
    }
}

const TIME_LAYOUTS: &[&str] = &["%d/%b/%Y:%H:%M:%S %z", "%Y-%m-%d %H:%M:%S"];

fn map_template_fields(event: &mut NormalizedEvent, fields: &HashMap<String, String>) {
    for key in ["time_local", "time_iso8601", "timestamp", "ts", "time"] {
        let Some(value) = fields.get(key) else { continue };
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            event.timestamp = dt.with_timezone(&Utc);
            break;
        }
        let mut matched = false;
        for layout in TIME_LAYOUTS {
            if let Ok(dt) = DateTime::parse_from_str(value, layout) {
                event.timestamp = dt.with_timezone(&Utc);
                matched = true;
                break;
            }
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, layout) {
                event.timestamp = Utc.from_utc_datetime(&naive);
                matched = true;
                break;
            }
        }
        if matched {
            break;
        }
    }
    if event.timestamp == DateTime::<Utc>::default() {
        event.timestamp = Utc::now();
    }

    let method = fields.get("method");
    let request = fields.get("request");
    event.operation = match (method, request) {
        (Some(m), Some(r)) => format!("{m} {r}"),
        (None, Some(r)) => r.clone(),
        _ => String::new(),
    };

    for key in ["status", "status_code"] {
        if let Some(v) = fields.get(key) {
            if let Ok(code) = v.parse::<i64>() {
                event.status_code = code;
                break;
            }
        }
    }

    for key in ["request_time", "upstream_response_time"] {
        if let Some(v) = fields.get(key) {
            if let Ok(secs) = v.parse::<f64>() {
                event.set_latency(std::time::Duration::from_nanos(
                    (secs.max(0.0) * 1_000_000_000.0) as u64,
                ));
                break;
            }
        }
    }

    if event.level.is_empty() && event.status_code > 0 {
        event.level = match event.status_code {
            c if c >= 500 => "error",
            c if c >= 400 => "warn",
            _ => "info",
        }
        .to_string();
    }

    for key in ["request_id", "trace_id", "x_request_id"] {
        if let Some(v) = fields.get(key) {
            if !v.is_empty() {
                event.trace_id = v.clone();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nginx_combined_scenario() {
        let template = r#"$remote_addr - $remote_user [$time_local] "$method $request $protocol" $status $body_bytes_sent "$http_referer" "$http_user_agent" $request_time $request_id"#;
        let parser = TemplateParser::compile(template).unwrap();

        let line = r#"192.168.1.42 - john [10/Feb/2024:13:55:36 +0300] "GET /api/users HTTP/1.1" 200 1543 "https://example.com" "Mozilla/5.0" 0.087 a1b2c3d4"#;

        let event = parser.parse_normalized(line, "file").unwrap();
        assert_eq!(event.status_code, 200);
        assert_eq!(event.operation, "GET /api/users");
        assert_eq!(event.latency().as_millis(), 87);
        assert_eq!(event.trace_id, "a1b2c3d4");
        assert_eq!(event.level, "info");
        assert_eq!(event.format, FORMAT_TEMPLATE);
    }

    #[test]
    fn non_matching_line_returns_none() {
        let parser = TemplateParser::compile("$remote_addr - $status").unwrap();
        assert!(parser.parse_normalized("not a matching line at all", "file").is_none());
    }

    #[test]
    fn error_level_from_status() {
        let parser = TemplateParser::compile("$status $request").unwrap();
        let event = parser.parse_normalized("503 /health", "file").unwrap();
        assert_eq!(event.level, "error");
    }
}
