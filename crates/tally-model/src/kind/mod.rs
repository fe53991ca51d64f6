use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Type of a metric family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Monotonic accumulator.
    Counter,
    /// Last written value.
    Gauge,
    /// Cumulative bucketed distribution.
    Histogram,
}

impl MetricKind {
    /// Token used on the `# TYPE` line.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            "histogram" => Ok(MetricKind::Histogram),
            _ => Err(ModelError::InvalidValue {
                field: "kind",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_type_tokens() {
        for kind in [MetricKind::Counter, MetricKind::Gauge, MetricKind::Histogram] {
            let parsed: MetricKind = kind.to_string().to_uppercase().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("summary".parse::<MetricKind>().is_err());
    }
}
