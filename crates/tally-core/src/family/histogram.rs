use std::{fmt, sync::Arc};

use tally_model::{BUCKET_LABEL, LabelSet, MetricKind, ModelError};

use super::{Accumulator, Family, Metric};
use crate::error::{CoreError, CoreResult};

/// Cumulative bucket counts of one histogram instance.
///
/// `counts[i]` holds every observation `<= bounds[i]`; the implicit `+Inf`
/// bucket is `count`.
#[derive(Debug)]
pub(crate) struct HistogramState {
    pub(crate) counts: Vec<u64>,
    pub(crate) sum: f64,
    pub(crate) count: u64,
}

impl HistogramState {
    fn observe(&mut self, bounds: &[f64], value: f64) {
        let first = bounds.partition_point(|b| *b < value);
        for c in &mut self.counts[first..] {
            *c += 1;
        }
        self.sum += value;
        self.count += 1;
    }
}

impl Accumulator for HistogramState {
    type Spec = Vec<f64>;
    const KIND: MetricKind = MetricKind::Histogram;
    const SPEC_NAME: &'static str = "buckets";

    fn zero(bounds: &Vec<f64>) -> Self {
        Self {
            counts: vec![0; bounds.len()],
            sum: 0.0,
            count: 0,
        }
    }

    fn check_labels(labels: &LabelSet) -> CoreResult<()> {
        if labels.contains(BUCKET_LABEL) {
            return Err(ModelError::ReservedLabel {
                name: BUCKET_LABEL.to_string(),
                kind: MetricKind::Histogram.as_str(),
            }
            .into());
        }
        Ok(())
    }

    type Handle = Histogram;

    fn handle(family: Arc<Family<Self>>) -> Histogram {
        Histogram(family)
    }

    fn from_metric(metric: &Metric) -> Option<Histogram> {
        metric.as_histogram().cloned()
    }

    fn family_of(handle: &Histogram) -> &Family<Self> {
        handle.family()
    }
}

/// Snapshot of one histogram instance.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper bound, cumulative count)` pairs, without the `+Inf` bucket.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

/// Handle to a histogram family.
#[derive(Clone)]
pub struct Histogram(Arc<Family<HistogramState>>);

impl Histogram {
    pub(crate) fn family(&self) -> &Family<HistogramState> {
        &self.0
    }

    /// Full metric name.
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Labels every instance of this family carries.
    pub fn labels(&self) -> &LabelSet {
        self.0.labels()
    }

    /// Bucket upper bounds, strictly increasing.
    pub fn bounds(&self) -> &[f64] {
        self.0.spec()
    }

    /// Record one observation.
    pub fn observe(&self, value: f64, labels: &LabelSet) -> CoreResult<()> {
        if !value.is_finite() {
            return Err(CoreError::NonFinite(value));
        }
        let bounds = self.0.spec();
        self.0.update(labels, |s| s.observe(bounds, value))
    }

    /// Copy of the instance state, `None` if never observed.
    pub fn snapshot(&self, labels: &LabelSet) -> CoreResult<Option<HistogramSnapshot>> {
        let bounds = self.0.spec();
        self.0.read(labels, |s| HistogramSnapshot {
            buckets: bounds.iter().copied().zip(s.counts.iter().copied()).collect(),
            sum: s.sum,
            count: s.count,
        })
    }
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram")
            .field("name", &self.name())
            .field("buckets", &self.bounds().len())
            .finish()
    }
}
