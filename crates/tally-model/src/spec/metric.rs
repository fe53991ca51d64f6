use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    domain::LabelSet,
    error::{ModelError, ModelResult},
    strategy::Buckets,
};

/// Options shared by every metric type.
///
/// The full metric name is `namespace_subsystem_name` with empty parts skipped;
/// the namespace comes from the collector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOpts {
    /// Base name, required.
    pub name: String,
    /// Optional middle segment of the full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
    /// Text of the `# HELP` line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Static labels of the family, merged over the collector labels.
    #[serde(default, skip_serializing_if = "LabelSet::is_empty")]
    pub labels: LabelSet,
}

impl MetricOpts {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn labels(mut self, labels: impl Into<LabelSet>) -> Self {
        self.labels = labels.into();
        self
    }

    pub fn label(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.labels.insert(key, val);
        self
    }
}

/// Gauge expiry: reset to `default_value` after `ttl_ms` without writes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expiry {
    pub ttl_ms: u64,
    #[serde(default)]
    pub default_value: f64,
}

impl Expiry {
    pub fn new(ttl: Duration, default_value: f64) -> Self {
        Self {
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            default_value,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.ttl_ms == 0 {
            return Err(ModelError::InvalidExpiry("ttl must be positive".to_string()));
        }
        if self.default_value.is_nan() {
            return Err(ModelError::InvalidExpiry(
                "default value must be a number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gauge registration options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeOpts {
    #[serde(flatten)]
    pub common: MetricOpts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Expiry>,
}

impl GaugeOpts {
    pub fn expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

impl From<MetricOpts> for GaugeOpts {
    fn from(common: MetricOpts) -> Self {
        Self {
            common,
            expiry: None,
        }
    }
}

/// Histogram registration options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramOpts {
    #[serde(flatten)]
    pub common: MetricOpts,
    #[serde(default)]
    pub buckets: Buckets,
}

impl HistogramOpts {
    pub fn buckets(mut self, buckets: Buckets) -> Self {
        self.buckets = buckets;
        self
    }
}

impl From<MetricOpts> for HistogramOpts {
    fn from(common: MetricOpts) -> Self {
        Self {
            common,
            buckets: Buckets::default(),
        }
    }
}
