//! Data model of the tally metrics engine: label sets, names, bucket layouts
//! and registration options. Nothing here holds runtime state.
mod domain;
pub use domain::{
    BUCKET_LABEL, LabelSet, escape_help, escape_label_value, full_name, validate_label_name,
    validate_metric_name,
};

mod error;
pub use error::{ModelError, ModelResult};

mod format;
pub use format::ExpositionFormat;

mod kind;
pub use kind::MetricKind;

mod spec;
pub use spec::{
    CollectorConfig, DEFAULT_TRIGGER_TIMEOUT_MS, Expiry, GaugeOpts, HistogramOpts, MetricOpts,
};

mod strategy;
pub use strategy::{Buckets, LabelPrecedence, MAX_BUCKETS};
