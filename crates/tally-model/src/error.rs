use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),

    #[error("invalid label name: {0:?}")]
    InvalidLabelName(String),

    #[error("label name is reserved for {kind} metrics: {name:?}")]
    ReservedLabel { name: String, kind: &'static str },

    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),

    #[error("invalid expiry: {0}")]
    InvalidExpiry(String),

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

pub type ModelResult<T> = Result<T, ModelError>;
