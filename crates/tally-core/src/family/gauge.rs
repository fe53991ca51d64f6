use std::{fmt, sync::Arc};

use tally_model::{Expiry, LabelSet, MetricKind};
use tokio::time::Instant;

use super::{Accumulator, Family, Metric};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Default)]
pub(crate) struct GaugeState {
    pub(crate) value: f64,
    /// Last write; cleared once the instance has expired.
    touched: Option<Instant>,
}

impl Accumulator for GaugeState {
    type Spec = Option<Expiry>;
    const KIND: MetricKind = MetricKind::Gauge;
    const SPEC_NAME: &'static str = "expiry";

    fn zero(_: &Option<Expiry>) -> Self {
        Self::default()
    }

    type Handle = Gauge;

    fn handle(family: Arc<Family<Self>>) -> Gauge {
        Gauge(family)
    }

    fn from_metric(metric: &Metric) -> Option<Gauge> {
        metric.as_gauge().cloned()
    }

    fn family_of(handle: &Gauge) -> &Family<Self> {
        handle.family()
    }
}

/// Handle to a gauge family.
#[derive(Clone)]
pub struct Gauge(Arc<Family<GaugeState>>);

impl Gauge {
    pub(crate) fn family(&self) -> &Family<GaugeState> {
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

    /// Expiry policy, if configured.
    pub fn expiry(&self) -> Option<&Expiry> {
        self.0.spec().as_ref()
    }

    /// Overwrite the value and record the write time.
    pub fn set(&self, value: f64, labels: &LabelSet) -> CoreResult<()> {
        if value.is_nan() {
            return Err(CoreError::NonFinite(value));
        }
        let now = Instant::now();
        self.0.update(labels, |s| {
            s.value = value;
            s.touched = Some(now);
        })
    }

    /// Shift the value by `delta` (may be negative); counts as a write.
    ///
    /// Fails without touching the instance if the result would be NaN.
    pub fn add(&self, delta: f64, labels: &LabelSet) -> CoreResult<()> {
        if delta.is_nan() {
            return Err(CoreError::NonFinite(delta));
        }
        let now = Instant::now();
        self.0.update(labels, |s| {
            let next = s.value + delta;
            if next.is_nan() {
                return Err(CoreError::NonFinite(next));
            }
            s.value = next;
            s.touched = Some(now);
            Ok(())
        })?
    }

    /// Current value, `None` if the label combination was never touched.
    pub fn value(&self, labels: &LabelSet) -> CoreResult<Option<f64>> {
        self.0.read(labels, |s| s.value)
    }

    /// Reset every instance idle for longer than the TTL to the default value.
    ///
    /// The write time is cleared on reset, so an instance is reset at most once
    /// per write. Returns the number of instances reset.
    pub(crate) fn expire(&self, now: Instant) -> usize {
        let Some(expiry) = self.0.spec() else {
            return 0;
        };
        let ttl = expiry.ttl();

        self.0.with_instances(|instances| {
            let mut reset = 0;
            for state in instances.values_mut() {
                let stale = state
                    .touched
                    .is_some_and(|at| now.saturating_duration_since(at) > ttl);
                if stale {
                    state.value = expiry.default_value;
                    state.touched = None;
                    reset += 1;
                }
            }
            reset
        })
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge")
            .field("name", &self.name())
            .field("expiry", &self.expiry())
            .finish()
    }
}
