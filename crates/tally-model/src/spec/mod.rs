mod collector;
pub use collector::{CollectorConfig, DEFAULT_TRIGGER_TIMEOUT_MS};

mod metric;
pub use metric::{Expiry, GaugeOpts, HistogramOpts, MetricOpts};
