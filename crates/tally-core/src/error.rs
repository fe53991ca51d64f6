use std::{fmt, time::Duration};

use tally_model::{MetricKind, ModelError};
use thiserror::Error;

/// Errors raised synchronously by registration and mutation calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("metric {name:?} is already registered as {registered}, requested {requested}")]
    KindMismatch {
        name: String,
        registered: MetricKind,
        requested: MetricKind,
    },

    #[error("metric {0:?} is not registered on this collector")]
    UnknownMetric(String),

    #[error("counter delta must not be negative: {0}")]
    NegativeDelta(f64),

    #[error("sample value must be finite, got {0}")]
    NonFinite(f64),
}

impl CoreError {
    /// Registration-time error (names, labels, buckets, type conflicts).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CoreError::Model(_) | CoreError::KindMismatch { .. } | CoreError::UnknownMetric(_)
        )
    }

    /// Rejected observation; the metric state is unchanged.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::NegativeDelta(_) | CoreError::NonFinite(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Failure of a single triggered producer during collection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProducerError {
    #[error("producer failed: {0}")]
    Failed(String),

    #[error("producer timed out after {0:?}")]
    TimedOut(Duration),

    #[error("producer panicked")]
    Panicked,

    #[error("producer task was cancelled")]
    Cancelled,
}

impl ProducerError {
    /// Wrap any displayable error as [`ProducerError::Failed`].
    pub fn failed(err: impl fmt::Display) -> Self {
        ProducerError::Failed(err.to_string())
    }
}

/// Producer failure attributed to the metric it feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerFailure {
    /// Full name of the target metric, which is left out of the output.
    pub metric: String,
    pub error: ProducerError,
}

impl fmt::Display for ProducerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.metric, self.error)
    }
}

/// Errors that abort a whole collection.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to render metrics: {0}")]
    Serialization(#[from] fmt::Error),
}
