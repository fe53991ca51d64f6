//! Metric families and their per-label-set instances.
//!
//! A family is a named, typed group of instances keyed by the canonical key of
//! their fully resolved label set. Every family guards its instance map with a
//! single mutex, so each mutation is atomic with respect to other mutations,
//! the expiry sweep and the serializer.
mod counter;
pub use counter::Counter;
pub(crate) use counter::CounterState;

mod gauge;
pub use gauge::Gauge;
pub(crate) use gauge::GaugeState;

mod histogram;
pub use histogram::{Histogram, HistogramSnapshot};
pub(crate) use histogram::HistogramState;

use std::{collections::BTreeMap, fmt, sync::Arc, sync::Mutex};

use tally_model::{LabelPrecedence, LabelSet, MetricKind};

use crate::{error::CoreResult, sync::lock};

/// Per-type accumulator state of one instance.
pub(crate) trait Accumulator: Sized + Send + 'static {
    /// Family-level configuration shared by all instances.
    type Spec: PartialEq + Send + Sync + 'static;

    const KIND: MetricKind;

    /// Name of `Spec` in diagnostics.
    const SPEC_NAME: &'static str;

    /// Zero value of a freshly seen label combination.
    fn zero(spec: &Self::Spec) -> Self;

    /// Reject labels the type reserves for itself.
    fn check_labels(_labels: &LabelSet) -> CoreResult<()> {
        Ok(())
    }

    /// Public handle type of the family.
    type Handle: Clone + Into<Metric>;

    fn handle(family: Arc<Family<Self>>) -> Self::Handle;

    fn from_metric(metric: &Metric) -> Option<Self::Handle>;

    fn family_of(handle: &Self::Handle) -> &Family<Self>;
}

pub(crate) struct Family<S: Accumulator> {
    name: String,
    help: Option<String>,
    labels: LabelSet,
    precedence: LabelPrecedence,
    spec: S::Spec,
    instances: Mutex<BTreeMap<String, S>>,
}

impl<S: Accumulator> Family<S> {
    pub(crate) fn new(
        name: String,
        help: Option<String>,
        labels: LabelSet,
        precedence: LabelPrecedence,
        spec: S::Spec,
    ) -> Self {
        Self {
            name,
            help,
            labels,
            precedence,
            spec,
            instances: Mutex::new(BTreeMap::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub(crate) fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub(crate) fn spec(&self) -> &S::Spec {
        &self.spec
    }

    /// Family labels merged with call-site labels.
    fn resolve(&self, dynamic: &LabelSet) -> CoreResult<LabelSet> {
        dynamic.validate()?;
        S::check_labels(dynamic)?;
        Ok(self.precedence.resolve(&self.labels, dynamic))
    }

    /// Apply `f` to the instance for `dynamic`, creating it on first touch.
    pub(crate) fn update<R>(&self, dynamic: &LabelSet, f: impl FnOnce(&mut S) -> R) -> CoreResult<R> {
        let key = self.resolve(dynamic)?.canonical_key();
        let mut instances = lock(&self.instances);
        let state = instances
            .entry(key)
            .or_insert_with(|| S::zero(&self.spec));
        Ok(f(state))
    }

    /// Read the instance for `dynamic` without creating it.
    pub(crate) fn read<R>(&self, dynamic: &LabelSet, f: impl FnOnce(&S) -> R) -> CoreResult<Option<R>> {
        let key = self.resolve(dynamic)?.canonical_key();
        Ok(lock(&self.instances).get(&key).map(f))
    }

    /// Run `f` over all instances while holding the family lock.
    pub(crate) fn with_instances<R>(&self, f: impl FnOnce(&mut BTreeMap<String, S>) -> R) -> R {
        f(&mut lock(&self.instances))
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.instances).len()
    }

    /// Registration options that differ from the ones this family was created
    /// with. `help: None` means the caller did not set one.
    pub(crate) fn conflicts(
        &self,
        labels: &LabelSet,
        help: Option<&str>,
        spec: &S::Spec,
    ) -> Vec<&'static str> {
        let mut out = Vec::new();
        if &self.labels != labels {
            out.push("labels");
        }
        if help.is_some_and(|h| self.help() != Some(h)) {
            out.push("help");
        }
        if &self.spec != spec {
            out.push(S::SPEC_NAME);
        }
        out
    }
}

/// Type-erased handle to a registered family.
#[derive(Clone)]
pub enum Metric {
    Counter(Counter),
    Gauge(Gauge),
    Histogram(Histogram),
}

impl Metric {
    /// Full metric name.
    pub fn name(&self) -> &str {
        match self {
            Metric::Counter(c) => c.name(),
            Metric::Gauge(g) => g.name(),
            Metric::Histogram(h) => h.name(),
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Histogram(_) => MetricKind::Histogram,
        }
    }

    /// Number of label combinations seen so far.
    pub fn cardinality(&self) -> usize {
        match self {
            Metric::Counter(c) => c.family().len(),
            Metric::Gauge(g) => g.family().len(),
            Metric::Histogram(h) => h.family().len(),
        }
    }

    pub fn as_counter(&self) -> Option<&Counter> {
        match self {
            Metric::Counter(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_gauge(&self) -> Option<&Gauge> {
        match self {
            Metric::Gauge(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&Histogram> {
        match self {
            Metric::Histogram(h) => Some(h),
            _ => None,
        }
    }

    /// `true` if both handles point at the same family.
    pub fn same_family(&self, other: &Metric) -> bool {
        match (self, other) {
            (Metric::Counter(a), Metric::Counter(b)) => std::ptr::eq(a.family(), b.family()),
            (Metric::Gauge(a), Metric::Gauge(b)) => std::ptr::eq(a.family(), b.family()),
            (Metric::Histogram(a), Metric::Histogram(b)) => std::ptr::eq(a.family(), b.family()),
            _ => false,
        }
    }
}

impl From<Counter> for Metric {
    fn from(c: Counter) -> Self {
        Metric::Counter(c)
    }
}

impl From<Gauge> for Metric {
    fn from(g: Gauge) -> Self {
        Metric::Gauge(g)
    }
}

impl From<Histogram> for Metric {
    fn from(h: Histogram) -> Self {
        Metric::Histogram(h)
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}
