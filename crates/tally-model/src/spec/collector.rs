use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{LabelSet, validate_metric_name},
    error::{ModelError, ModelResult},
    strategy::LabelPrecedence,
};

/// Default upper bound for a single triggered producer during collection.
pub const DEFAULT_TRIGGER_TIMEOUT_MS: u64 = 10_000;

/// Configuration of a root collector.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorConfig {
    /// Prefix of every metric name registered on the collector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Labels inherited by every family of the collector.
    #[serde(skip_serializing_if = "LabelSet::is_empty")]
    pub labels: LabelSet,
    /// Collision policy for inherited vs. specific labels.
    pub precedence: LabelPrecedence,
    /// How long a triggered producer may run during one collection.
    pub trigger_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            labels: LabelSet::new(),
            precedence: LabelPrecedence::default(),
            trigger_timeout_ms: DEFAULT_TRIGGER_TIMEOUT_MS,
        }
    }
}

impl CollectorConfig {
    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the inherited labels.
    pub fn labels(mut self, labels: impl Into<LabelSet>) -> Self {
        self.labels = labels.into();
        self
    }

    /// Add one inherited label.
    pub fn label(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.labels.insert(key, val);
        self
    }

    /// Set the label precedence policy.
    pub fn precedence(mut self, precedence: LabelPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Set the per-producer timeout.
    pub fn trigger_timeout(mut self, timeout: Duration) -> Self {
        self.trigger_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Per-producer timeout as a [`Duration`].
    pub fn trigger_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.trigger_timeout_ms)
    }

    /// Check the namespace, label names and producer timeout.
    pub fn validate(&self) -> ModelResult<()> {
        if self.trigger_timeout_ms == 0 {
            return Err(ModelError::InvalidValue {
                field: "triggerTimeoutMs",
                value: "0".to_string(),
            });
        }
        if let Some(ns) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            validate_metric_name(ns)?;
        }
        self.labels.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: CollectorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, CollectorConfig::default());
        assert_eq!(cfg.trigger_timeout_duration(), Duration::from_secs(10));
    }

    #[test]
    fn parses_full_config() {
        let json = r#"{
            "namespace": "app",
            "labels": {"hostname": "db1", "dc": "east"},
            "precedence": "inherited",
            "triggerTimeoutMs": 250
        }"#;
        let cfg: CollectorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(cfg.namespace.as_deref(), Some("app"));
        assert_eq!(cfg.labels.get("dc"), Some("east"));
        assert_eq!(cfg.precedence, LabelPrecedence::Inherited);
        assert_eq!(cfg.trigger_timeout_duration(), Duration::from_millis(250));
    }

    #[test]
    fn validate_rejects_bad_labels_and_namespace() {
        let cfg = CollectorConfig::default().labels([("bad-name", "x")]);
        assert!(matches!(cfg.validate(), Err(ModelError::InvalidLabelName(_))));

        let cfg = CollectorConfig::default().namespace("9lives");
        assert!(matches!(cfg.validate(), Err(ModelError::InvalidMetricName(_))));

        let cfg = CollectorConfig::default().namespace("");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_trigger_timeout() {
        let cfg = CollectorConfig::default().trigger_timeout(Duration::ZERO);
        assert!(matches!(
            cfg.validate(),
            Err(ModelError::InvalidValue { field: "triggerTimeoutMs", .. })
        ));

        let cfg: CollectorConfig = serde_json::from_str(r#"{"triggerTimeoutMs": 0}"#).unwrap();
        assert!(cfg.validate().is_err());
        assert!(CollectorConfig::default().trigger_timeout(Duration::from_millis(1)).validate().is_ok());
    }
}
