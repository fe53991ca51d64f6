//! Client-side metrics engine.
//!
//! A [`Collector`] owns counter, gauge and histogram families. Application code
//! records observations through the family handles; a scrape handler calls
//! [`Collector::collect`] to run triggered producers, expire idle gauges and
//! render everything in the Prometheus text format.
//!
//! ## Example
//! ```rust
//! use tally_core::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let collector = Collector::new(CollectorConfig::default().namespace("app"))?;
//! let requests = collector.counter(MetricOpts::new("requests_total").help("Requests served"))?;
//!
//! requests.increment(&LabelSet::from([("method", "get")]))?;
//!
//! let out = collector.collect(ExpositionFormat::Prometheus).await?;
//! assert!(out.text().contains(r#"app_requests_total{method="get"} 1"#));
//! # Ok(())
//! # }
//! ```
pub mod collector;
pub mod error;
pub mod family;
pub mod trigger;

mod expose;
mod sync;

pub use collector::{Collection, Collector};
pub use error::{CollectError, CoreError, CoreResult, ProducerError, ProducerFailure};
pub use family::{Counter, Gauge, Histogram, HistogramSnapshot, Metric};
pub use trigger::{Trigger, TriggerFn};

pub mod prelude {
    pub use crate::collector::{Collection, Collector};
    pub use crate::error::{CollectError, CoreError, ProducerError};
    pub use crate::family::{Counter, Gauge, Histogram, Metric};
    pub use crate::trigger::{Trigger, TriggerFn};
    pub use tally_model::{
        Buckets, CollectorConfig, Expiry, ExpositionFormat, GaugeOpts, HistogramOpts,
        LabelPrecedence, LabelSet, MetricOpts,
    };
}
