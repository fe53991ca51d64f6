use std::{fmt, sync::Arc};

use tally_model::{LabelSet, MetricKind};

use super::{Accumulator, Family, Metric};
use crate::error::{CoreError, CoreResult};

/// Monotonic accumulator of one counter instance.
///
/// Stored as `f64`: integral totals are exact up to 2^53 - 1; past that,
/// small increments may be absorbed by rounding.
#[derive(Debug, Default)]
pub(crate) struct CounterState {
    pub(crate) value: f64,
}

impl Accumulator for CounterState {
    type Spec = ();
    const KIND: MetricKind = MetricKind::Counter;
    const SPEC_NAME: &'static str = "options";

    fn zero(_: &()) -> Self {
        Self::default()
    }

    type Handle = Counter;

    fn handle(family: Arc<Family<Self>>) -> Counter {
        Counter(family)
    }

    fn from_metric(metric: &Metric) -> Option<Counter> {
        metric.as_counter().cloned()
    }

    fn family_of(handle: &Counter) -> &Family<Self> {
        handle.family()
    }
}

/// Handle to a counter family.
///
/// Cheap to clone; all clones (and every handle returned by re-registering the
/// same name) share the same instances.
#[derive(Clone)]
pub struct Counter(Arc<Family<CounterState>>);

impl Counter {
    pub(crate) fn family(&self) -> &Family<CounterState> {
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

    /// Add one.
    pub fn increment(&self, labels: &LabelSet) -> CoreResult<()> {
        self.add(1.0, labels)
    }

    /// Add `delta`, which must be finite and non-negative.
    pub fn add(&self, delta: f64, labels: &LabelSet) -> CoreResult<()> {
        if !delta.is_finite() {
            return Err(CoreError::NonFinite(delta));
        }
        if delta < 0.0 {
            return Err(CoreError::NegativeDelta(delta));
        }
        self.0.update(labels, |s| s.value += delta)
    }

    /// Current value, `None` if the label combination was never touched.
    pub fn value(&self, labels: &LabelSet) -> CoreResult<Option<f64>> {
        self.0.read(labels, |s| s.value)
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter").field("name", &self.name()).finish()
    }
}
