use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The closed set of format tags a `NormalizedEvent` can carry.
pub const FORMAT_JSON: &str = "json";
pub const FORMAT_ECS: &str = "ecs_json";
pub const FORMAT_METRIC: &str = "metric_json";
pub const FORMAT_TEMPLATE: &str = "template";
pub const FORMAT_PLAIN: &str = "plain";
pub const FORMAT_EMPTY: &str = "empty";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event: timestamp is required")]
    MissingTimestamp,
    #[error("event: src_service is required")]
    MissingSrcService,
}

/// The unified event schema produced by the parse stage and carried,
/// unchanged in shape, through transform/resolve/sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub timestamp: DateTime<Utc>,
    pub src_service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dst_service: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub span_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub operation: String,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub status_code: i64,
    /// Operation latency, stored in nanoseconds (mirrors a `time.Duration`).
    #[serde(default, rename = "latency", skip_serializing_if = "is_zero_i64")]
    pub latency_ns: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub level: String,
    pub format: String,
    pub source_name: String,
    #[serde(default)]
    pub raw: HashMap<String, Value>,
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

impl NormalizedEvent {
    pub fn new(format: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            src_service: String::new(),
            dst_service: String::new(),
            trace_id: String::new(),
            span_id: String::new(),
            operation: String::new(),
            status_code: 0,
            latency_ns: 0,
            error_rate: None,
            level: String::new(),
            format: format.into(),
            source_name: source_name.into(),
            raw: HashMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp == DateTime::<Utc>::default() {
            return Err(ValidationError::MissingTimestamp);
        }
        if self.src_service.is_empty() {
            return Err(ValidationError::MissingSrcService);
        }
        Ok(())
    }

    /// `IsMetric ≡ latency > 0 ∨ status_code ≥ 100`.
    pub fn is_metric(&self) -> bool {
        self.latency_ns > 0 || self.status_code >= 100
    }

    /// `HasCorrelationKey ≡ trace_id ≠ "" ∨ (src_service ≠ "" ∧ dst_service ≠ "")`.
    pub fn has_correlation_key(&self) -> bool {
        !self.trace_id.is_empty() || (!self.src_service.is_empty() && !self.dst_service.is_empty())
    }

    /// `trace_id` if set, else the stable `"src->dst:operation"` join.
    pub fn correlation_key(&self) -> String {
        if !self.trace_id.is_empty() {
            return self.trace_id.clone();
        }
        format!("{}->{}:{}", self.src_service, self.dst_service, self.operation)
    }

    pub fn latency(&self) -> std::time::Duration {
        std::time::Duration::from_nanos(self.latency_ns.max(0) as u64)
    }

    pub fn set_latency(&mut self, d: std::time::Duration) {
        self.latency_ns = d.as_nanos() as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_event() -> NormalizedEvent {
        let mut e = NormalizedEvent::new(FORMAT_PLAIN, "stdin");
        e.src_service = "auth-service".to_string();
        e
    }

    #[test]
    fn validate_ok() {
        assert!(valid_event().validate().is_ok());
    }

    #[test]
    fn validate_zero_timestamp() {
        let mut e = valid_event();
        e.timestamp = DateTime::<Utc>::default();
        assert_eq!(e.validate(), Err(ValidationError::MissingTimestamp));
    }

    #[test]
    fn validate_empty_src_service() {
        let mut e = valid_event();
        e.src_service.clear();
        assert_eq!(e.validate(), Err(ValidationError::MissingSrcService));
    }

    #[test]
    fn is_metric_with_latency() {
        let mut e = valid_event();
        e.set_latency(std::time::Duration::from_millis(42));
        assert!(e.is_metric());
    }

    #[test]
    fn is_metric_with_status_code() {
        let mut e = valid_event();
        e.status_code = 200;
        assert!(e.is_metric());
    }

    #[test]
    fn is_metric_pure_log() {
        let mut e = valid_event();
        e.level = "info".to_string();
        assert!(!e.is_metric());
    }

    #[test]
    fn has_correlation_key_trace_id() {
        let mut e = valid_event();
        e.trace_id = "abc123".to_string();
        assert!(e.has_correlation_key());
    }

    #[test]
    fn has_correlation_key_src_dst() {
        let mut e = valid_event();
        e.dst_service = "payment-service".to_string();
        assert!(e.has_correlation_key());
    }

    #[test]
    fn has_correlation_key_src_only() {
        let e = valid_event();
        assert!(!e.has_correlation_key());
    }

    #[test]
    fn correlation_key_prefers_trace_id() {
        let mut e = valid_event();
        e.trace_id = "trace-xyz".to_string();
        e.dst_service = "other".to_string();
        e.operation = "GET /foo".to_string();
        assert_eq!(e.correlation_key(), "trace-xyz");
    }

    #[test]
    fn correlation_key_fallback_src_dst() {
        let mut e = valid_event();
        e.dst_service = "db-service".to_string();
        e.operation = "SELECT".to_string();
        assert_eq!(e.correlation_key(), "auth-service->db-service:SELECT");
    }

    #[test]
    fn correlation_key_empty_operation_is_stable() {
        let mut e = valid_event();
        e.dst_service = "cache".to_string();
        assert_eq!(e.correlation_key(), "auth-service->cache:");
    }
}
