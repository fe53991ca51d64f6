use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Output format accepted by `collect`.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpositionFormat {
    /// Prometheus text exposition format, version 0.0.4.
    #[default]
    Prometheus,
}

impl ExpositionFormat {
    /// HTTP `Content-Type` of the rendered output.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExpositionFormat::Prometheus => "text/plain; version=0.0.4; charset=utf-8",
        }
    }
}

impl fmt::Display for ExpositionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpositionFormat::Prometheus => f.write_str("prometheus"),
        }
    }
}

impl FromStr for ExpositionFormat {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prometheus" | "prom" | "text" | "0.0.4" => Ok(ExpositionFormat::Prometheus),
            _ => Err(ModelError::InvalidValue {
                field: "format",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        for s in ["prometheus", "PROM", " text "] {
            assert_eq!(s.parse::<ExpositionFormat>().unwrap(), ExpositionFormat::Prometheus);
        }
        assert!("json".parse::<ExpositionFormat>().is_err());
    }

    #[test]
    fn content_type_names_text_version() {
        assert!(ExpositionFormat::Prometheus.content_type().contains("version=0.0.4"));
    }
}
