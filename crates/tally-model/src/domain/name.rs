//! Metric and label name rules.
use crate::error::{ModelError, ModelResult};

/// Label name attached to histogram bucket samples.
pub const BUCKET_LABEL: &str = "le";

/// Validate a full metric name against `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn validate_metric_name(name: &str) -> ModelResult<()> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');

    if head_ok && tail_ok {
        Ok(())
    } else {
        Err(ModelError::InvalidMetricName(name.to_string()))
    }
}

/// Validate a label name against `[a-zA-Z_][a-zA-Z0-9_]*`.
///
/// Names starting with `__` are reserved for the monitoring system.
pub fn validate_label_name(name: &str) -> ModelResult<()> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if head_ok && tail_ok && !name.starts_with("__") {
        Ok(())
    } else {
        Err(ModelError::InvalidLabelName(name.to_string()))
    }
}

/// Join `namespace`, `subsystem` and `name` with `_`, skipping empty segments.
///
/// The result is not validated.
pub fn full_name(namespace: Option<&str>, subsystem: Option<&str>, name: &str) -> String {
    [namespace.unwrap_or(""), subsystem.unwrap_or(""), name]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}
