//! Root collector: owns the metric families and the triggered producers.
//!
//! Families are leaves. They are registered under the collector at creation and
//! live as long as it does, whether or not the caller keeps its handle.
mod collection;
pub use collection::Collection;

use std::{collections::BTreeMap, collections::HashSet, fmt, sync::Arc, sync::RwLock, time::Duration};

use tally_model::{
    CollectorConfig, ExpositionFormat, GaugeOpts, HistogramOpts, LabelPrecedence, LabelSet,
    MetricOpts, ModelError, full_name, validate_metric_name,
};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::{
    error::{CollectError, CoreError, CoreResult},
    expose,
    family::{
        Accumulator, Counter, CounterState, Family, Gauge, GaugeState, Histogram, HistogramState,
        Metric,
    },
    sync::{read, write},
    trigger::{Trigger, TriggerRegistry},
};

struct CollectorInner {
    namespace: Option<String>,
    labels: LabelSet,
    precedence: LabelPrecedence,
    trigger_timeout: Duration,
    families: RwLock<BTreeMap<String, Metric>>,
    triggers: TriggerRegistry,
}

/// Root of a metric hierarchy.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct Collector {
    inner: Arc<CollectorInner>,
}

impl Collector {
    /// Create a root collector.
    ///
    /// Fails if the namespace or any label name is invalid.
    pub fn new(cfg: CollectorConfig) -> CoreResult<Self> {
        cfg.validate()?;
        let trigger_timeout = cfg.trigger_timeout_duration();

        Ok(Self {
            inner: Arc::new(CollectorInner {
                namespace: cfg.namespace.filter(|ns| !ns.is_empty()),
                labels: cfg.labels,
                precedence: cfg.precedence,
                trigger_timeout,
                families: RwLock::new(BTreeMap::new()),
                triggers: TriggerRegistry::default(),
            }),
        })
    }

    pub fn namespace(&self) -> Option<&str> {
        self.inner.namespace.as_deref()
    }

    /// Labels inherited by every family.
    pub fn labels(&self) -> &LabelSet {
        &self.inner.labels
    }

    /// Get or create a counter family.
    pub fn counter(&self, opts: MetricOpts) -> CoreResult<Counter> {
        self.register::<CounterState>(&opts, ())
    }

    /// Get or create a gauge family.
    pub fn gauge(&self, opts: impl Into<GaugeOpts>) -> CoreResult<Gauge> {
        let opts = opts.into();
        if let Some(expiry) = &opts.expiry {
            expiry.validate()?;
        }
        self.register::<GaugeState>(&opts.common, opts.expiry)
    }

    /// Get or create a histogram family.
    pub fn histogram(&self, opts: impl Into<HistogramOpts>) -> CoreResult<Histogram> {
        let opts = opts.into();
        let bounds = opts.buckets.bounds()?;
        self.register::<HistogramState>(&opts.common, bounds)
    }

    /// Look up a registered family by full name.
    pub fn metric(&self, name: &str) -> Option<Metric> {
        read(&self.inner.families).get(name).cloned()
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        read(&self.inner.families).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach a producer that refreshes `target` at the start of every collection.
    ///
    /// With an `interval`, the producer is skipped while its last successful run
    /// is more recent than the interval. The target must be registered on this
    /// collector.
    pub fn add_triggered_metric(
        &self,
        target: impl Into<Metric>,
        producer: Arc<dyn Trigger>,
        interval: Option<Duration>,
    ) -> CoreResult<()> {
        let target = target.into();
        let registered = self
            .metric(target.name())
            .is_some_and(|m| m.same_family(&target));
        if !registered {
            return Err(CoreError::UnknownMetric(target.name().to_string()));
        }

        debug!(metric = %target.name(), producer = %producer.name(), ?interval, "triggered metric added");
        self.inner
            .triggers
            .register(target.name().to_string(), producer, interval);
        Ok(())
    }

    /// Run triggered producers, sweep expired gauges and render every family.
    ///
    /// A failing producer only removes its own family from the output; the
    /// failure is reported in [`Collection::failures`].
    #[instrument(level = "debug", skip(self, format), fields(format = %format))]
    pub async fn collect(&self, format: ExpositionFormat) -> Result<Collection, CollectError> {
        let failures = self.inner.triggers.run(self.inner.trigger_timeout).await;
        let skipped: HashSet<&str> = failures.iter().map(|f| f.metric.as_str()).collect();

        let families: Vec<Metric> = read(&self.inner.families).values().cloned().collect();

        let now = Instant::now();
        let expired: usize = families
            .iter()
            .filter_map(Metric::as_gauge)
            .map(|g| g.expire(now))
            .sum();

        let visible = families.iter().filter(|m| !skipped.contains(m.name()));
        let text = match format {
            ExpositionFormat::Prometheus => expose::encode(visible)?,
        };

        debug!(
            families = families.len(),
            skipped = skipped.len(),
            expired,
            bytes = text.len(),
            "collection rendered"
        );
        Ok(Collection::new(format, text, failures))
    }

    /// Shared registration path: full name, validation, idempotent lookup.
    fn register<S: Accumulator>(&self, opts: &MetricOpts, spec: S::Spec) -> CoreResult<S::Handle> {
        if opts.name.is_empty() {
            return Err(ModelError::InvalidMetricName(opts.name.clone()).into());
        }
        let name = full_name(
            self.inner.namespace.as_deref(),
            opts.subsystem.as_deref(),
            &opts.name,
        );
        validate_metric_name(&name)?;
        opts.labels.validate()?;

        let labels = self.inner.precedence.resolve(&self.inner.labels, &opts.labels);
        S::check_labels(&labels)?;

        let mut families = write(&self.inner.families);
        if let Some(existing) = families.get(&name) {
            return match S::from_metric(existing) {
                Some(handle) => {
                    let ignored = S::family_of(&handle).conflicts(&labels, opts.help.as_deref(), &spec);
                    if ignored.is_empty() {
                        debug!(metric = %name, kind = %S::KIND, "returning registered family");
                    } else {
                        warn!(
                            metric = %name,
                            kind = %S::KIND,
                            ?ignored,
                            "family already registered; differing options ignored"
                        );
                    }
                    Ok(handle)
                }
                None => Err(CoreError::KindMismatch {
                    name,
                    registered: existing.kind(),
                    requested: S::KIND,
                }),
            };
        }

        let handle = S::handle(Arc::new(Family::new(
            name.clone(),
            opts.help.clone(),
            labels,
            self.inner.precedence,
            spec,
        )));
        families.insert(name.clone(), handle.clone().into());
        debug!(metric = %name, kind = %S::KIND, "family registered");
        Ok(handle)
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("namespace", &self.namespace())
            .field("labels", self.labels())
            .field("families", &self.len())
            .field("triggers", &self.inner.triggers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProducerError;
    use crate::trigger::TriggerFn;
    use tally_model::{Buckets, Expiry};

    fn collector(ns: &str) -> Collector {
        Collector::new(CollectorConfig::default().namespace(ns)).unwrap()
    }

    async fn render(c: &Collector) -> String {
        c.collect(ExpositionFormat::Prometheus).await.unwrap().into_text()
    }

    #[test]
    fn full_name_joins_namespace_subsystem_and_name() {
        let c = collector("app");
        let m = c
            .counter(MetricOpts::new("requests_total").subsystem("http"))
            .unwrap();
        assert_eq!(m.name(), "app_http_requests_total");

        let bare = Collector::new(CollectorConfig::default()).unwrap();
        assert_eq!(bare.counter(MetricOpts::new("up")).unwrap().name(), "up");
    }

    #[test]
    fn registration_is_idempotent() {
        let c = collector("app");
        let a = c.counter(MetricOpts::new("jobs_total")).unwrap();
        let b = c.counter(MetricOpts::new("jobs_total").help("ignored")).unwrap();

        a.increment(&LabelSet::new()).unwrap();
        b.increment(&LabelSet::new()).unwrap();

        assert!(Metric::from(a.clone()).same_family(&b.into()));
        assert_eq!(a.value(&LabelSet::new()).unwrap(), Some(2.0));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn same_name_with_other_kind_fails() {
        let c = collector("app");
        c.counter(MetricOpts::new("jobs")).unwrap();

        let err = c.gauge(MetricOpts::new("jobs")).unwrap_err();
        assert_eq!(
            err,
            CoreError::KindMismatch {
                name: "app_jobs".into(),
                registered: tally_model::MetricKind::Counter,
                requested: tally_model::MetricKind::Gauge,
            }
        );
        assert!(err.is_config());
    }

    #[test]
    fn invalid_names_are_config_errors() {
        assert!(Collector::new(CollectorConfig::default().namespace("9bad")).is_err());
        assert!(
            Collector::new(CollectorConfig::default().label("bad-label", "x")).is_err()
        );

        let c = collector("app");
        assert!(c.counter(MetricOpts::new("")).unwrap_err().is_config());
        assert!(c.counter(MetricOpts::new("has space")).unwrap_err().is_config());
        assert!(
            c.counter(MetricOpts::new("ok").label("__reserved", "x"))
                .unwrap_err()
                .is_config()
        );
        assert!(
            c.histogram(MetricOpts::new("lat").label("le", "1"))
                .unwrap_err()
                .is_config()
        );
        assert!(
            c.histogram(HistogramOpts::from(MetricOpts::new("lat")).buckets(Buckets::explicit(vec![2.0, 1.0])))
                .unwrap_err()
                .is_config()
        );
        assert!(c.is_empty());
    }

    #[test]
    fn specific_labels_win_by_default() {
        let c = Collector::new(
            CollectorConfig::default()
                .label("env", "prod")
                .label("region", "eu"),
        )
        .unwrap();
        let m = c.counter(MetricOpts::new("x_total").label("env", "dev")).unwrap();

        assert_eq!(m.labels(), &LabelSet::from([("env", "dev"), ("region", "eu")]));
    }

    #[test]
    fn inherited_precedence_keeps_collector_labels() {
        let c = Collector::new(
            CollectorConfig::default()
                .label("env", "prod")
                .precedence(LabelPrecedence::Inherited),
        )
        .unwrap();
        let m = c.counter(MetricOpts::new("x_total").label("env", "dev")).unwrap();

        m.increment(&LabelSet::from([("env", "test"), ("op", "a")])).unwrap();
        assert_eq!(m.labels().get("env"), Some("prod"));
        assert_eq!(
            m.value(&LabelSet::from([("op", "a")])).unwrap(),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn renders_prometheus_text() {
        let c = Collector::new(CollectorConfig::default().namespace("app").label("host", "a")).unwrap();

        let req = c
            .counter(MetricOpts::new("requests_total").help("Requests served.\nTotal."))
            .unwrap();
        req.add(3.0, &LabelSet::from([("path", "/say \"hi\"")])).unwrap();

        let temp = c.gauge(MetricOpts::new("temperature")).unwrap();
        temp.set(-1.5, &LabelSet::new()).unwrap();

        let lat = c
            .histogram(
                HistogramOpts::from(MetricOpts::new("latency_seconds").help("Latency."))
                    .buckets(Buckets::explicit(vec![0.5, 1.0])),
            )
            .unwrap();
        lat.observe(0.25, &LabelSet::new()).unwrap();
        lat.observe(3.0, &LabelSet::new()).unwrap();

        // registered but never touched
        c.counter(MetricOpts::new("idle_total")).unwrap();

        let expected = concat!(
            "# HELP app_latency_seconds Latency.\n",
            "# TYPE app_latency_seconds histogram\n",
            "app_latency_seconds_bucket{host=\"a\",le=\"0.5\"} 1\n",
            "app_latency_seconds_bucket{host=\"a\",le=\"1\"} 1\n",
            "app_latency_seconds_bucket{host=\"a\",le=\"+Inf\"} 2\n",
            "app_latency_seconds_sum{host=\"a\"} 3.25\n",
            "app_latency_seconds_count{host=\"a\"} 2\n",
            "# HELP app_requests_total Requests served.\\nTotal.\n",
            "# TYPE app_requests_total counter\n",
            "app_requests_total{host=\"a\",path=\"/say \\\"hi\\\"\"} 3\n",
            "# TYPE app_temperature gauge\n",
            "app_temperature{host=\"a\"} -1.5\n",
        );

        let out = c.collect(ExpositionFormat::Prometheus).await.unwrap();
        assert_eq!(out.text(), expected);
        assert!(out.is_complete());
        assert_eq!(out.content_type(), "text/plain; version=0.0.4; charset=utf-8");
    }

    #[tokio::test]
    async fn collect_is_deterministic() {
        let c = collector("app");
        let m = c.counter(MetricOpts::new("hits_total")).unwrap();
        for v in ["z", "a", "m"] {
            m.increment(&LabelSet::from([("k", v)])).unwrap();
        }

        let first = render(&c).await;
        let second = render(&c).await;
        assert_eq!(first, second);
        assert!(first.find("k=\"a\"").unwrap() < first.find("k=\"z\"").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_gauges_expire_during_collect() {
        let c = collector("app");
        let g = c
            .gauge(GaugeOpts::from(MetricOpts::new("inflight")).expiry(Expiry::new(Duration::from_secs(1), 0.0)))
            .unwrap();
        g.set(5.0, &LabelSet::new()).unwrap();

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(render(&c).await.contains("app_inflight 5\n"));

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(render(&c).await.contains("app_inflight 0\n"));
        assert_eq!(g.value(&LabelSet::new()).unwrap(), Some(0.0));
    }

    #[tokio::test]
    async fn triggered_metric_is_refreshed_on_collect() {
        let c = collector("app");
        let g = c.gauge(MetricOpts::new("queue_depth")).unwrap();

        let target = g.clone();
        let producer = TriggerFn::arc("queue", move || {
            let g = target.clone();
            async move {
                g.add(1.0, &LabelSet::new()).map_err(ProducerError::failed)
            }
        });
        c.add_triggered_metric(g.clone(), producer, None).unwrap();

        assert!(render(&c).await.contains("app_queue_depth 1\n"));
        assert!(render(&c).await.contains("app_queue_depth 2\n"));
    }

    #[tokio::test]
    async fn failing_producer_only_hides_its_own_family() {
        let c = collector("app");
        let good = c.counter(MetricOpts::new("good_total")).unwrap();
        let bad = c.gauge(MetricOpts::new("bad")).unwrap();
        good.increment(&LabelSet::new()).unwrap();
        bad.set(1.0, &LabelSet::new()).unwrap();

        let producer = TriggerFn::arc("bad", || async {
            Err::<(), ProducerError>(ProducerError::failed("source unavailable"))
        });
        c.add_triggered_metric(bad, producer, None).unwrap();

        let out = c.collect(ExpositionFormat::Prometheus).await.unwrap();
        assert!(out.text().contains("app_good_total 1\n"));
        assert!(!out.text().contains("app_bad"));
        assert!(!out.is_complete());
        assert_eq!(out.failures()[0].metric, "app_bad");
    }

    #[test]
    fn triggers_need_a_family_of_this_collector() {
        let a = collector("a");
        let b = collector("a");
        let foreign = b.gauge(MetricOpts::new("x")).unwrap();
        a.gauge(MetricOpts::new("x")).unwrap();

        let producer = TriggerFn::arc("noop", || async { Ok::<(), ProducerError>(()) });
        let err = a.add_triggered_metric(foreign, producer, None).unwrap_err();
        assert_eq!(err, CoreError::UnknownMetric("a_x".into()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let c = collector("app");
        let m = c.counter(MetricOpts::new("ops_total")).unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let m = m.clone();
                tokio::spawn(async move {
                    for _ in 0..1000 {
                        m.increment(&LabelSet::from([("op", "w")])).unwrap();
                    }
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }

        assert_eq!(m.value(&LabelSet::from([("op", "w")])).unwrap(), Some(8000.0));
    }

    #[tokio::test]
    async fn high_cardinality_family_renders_every_instance() {
        let c = collector("app");
        let m = c.counter(MetricOpts::new("ids_total")).unwrap();
        for i in 0..10_000 {
            m.increment(&LabelSet::from([("id", i.to_string())])).unwrap();
        }

        assert_eq!(c.metric("app_ids_total").unwrap().cardinality(), 10_000);
        let text = render(&c).await;
        assert_eq!(text.lines().filter(|l| l.starts_with("app_ids_total{")).count(), 10_000);
    }

    #[test]
    fn reregistration_keeps_first_options() {
        let c = collector("app");
        let first = c
            .histogram(
                HistogramOpts::from(MetricOpts::new("lat").label("tier", "a"))
                    .buckets(Buckets::explicit(vec![1.0])),
            )
            .unwrap();
        let again = c
            .histogram(
                HistogramOpts::from(MetricOpts::new("lat").label("tier", "b"))
                    .buckets(Buckets::explicit(vec![1.0, 2.0])),
            )
            .unwrap();

        assert!(Metric::from(first).same_family(&again.clone().into()));
        assert_eq!(again.bounds(), &[1.0]);
        assert_eq!(again.labels().get("tier"), Some("a"));
    }

    #[test]
    fn zero_trigger_timeout_is_rejected() {
        let err = Collector::new(CollectorConfig::default().trigger_timeout(Duration::ZERO)).unwrap_err();
        assert!(err.is_config());
    }

    fn sample(text: &str, prefix: &str) -> Option<u64> {
        text.lines()
            .find_map(|l| l.strip_prefix(prefix))
            .map(|v| v.parse().unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_collects_and_writes_stay_consistent() {
        let c = collector("app");
        let hits = c.counter(MetricOpts::new("hits_total")).unwrap();
        let lat = c
            .histogram(
                HistogramOpts::from(MetricOpts::new("lat_seconds"))
                    .buckets(Buckets::explicit(vec![0.1, 1.0])),
            )
            .unwrap();
        let level = c.gauge(MetricOpts::new("level")).unwrap();

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let (hits, lat, level) = (hits.clone(), lat.clone(), level.clone());
                tokio::spawn(async move {
                    for i in 0..500 {
                        hits.increment(&LabelSet::new()).unwrap();
                        lat.observe((i % 3) as f64 * 0.5, &LabelSet::new()).unwrap();
                        level.set(f64::from(w), &LabelSet::new()).unwrap();
                        if i % 50 == 0 {
                            tokio::task::yield_now().await;
                        }
                    }
                })
            })
            .collect();
        let scrapers: Vec<_> = (0..4)
            .map(|_| {
                let c = c.clone();
                tokio::spawn(async move {
                    let mut texts = Vec::new();
                    for _ in 0..10 {
                        texts.push(render(&c).await);
                        tokio::task::yield_now().await;
                    }
                    texts
                })
            })
            .collect();

        for w in writers {
            w.await.unwrap();
        }
        for s in scrapers {
            for text in s.await.unwrap() {
                let inf = sample(&text, "app_lat_seconds_bucket{le=\"+Inf\"} ");
                let count = sample(&text, "app_lat_seconds_count ");
                assert_eq!(inf, count, "{text}");
            }
        }

        let text = render(&c).await;
        assert_eq!(sample(&text, "app_hits_total "), Some(2000));
        assert_eq!(sample(&text, "app_lat_seconds_count "), Some(2000));
        assert_eq!(sample(&text, "app_lat_seconds_bucket{le=\"+Inf\"} "), Some(2000));
        assert_eq!(hits.value(&LabelSet::new()).unwrap(), Some(2000.0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sweeps_reset_an_idle_gauge_once() {
        let c = collector("app");
        let g = c
            .gauge(
                GaugeOpts::from(MetricOpts::new("idle"))
                    .expiry(Expiry::new(Duration::from_millis(10), -1.0)),
            )
            .unwrap();
        g.set(5.0, &LabelSet::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let now = Instant::now();
        let sweeps: Vec<_> = (0..8)
            .map(|_| {
                let g = g.clone();
                tokio::spawn(async move { g.expire(now) })
            })
            .collect();
        let mut reset = 0;
        for s in sweeps {
            reset += s.await.unwrap();
        }
        assert_eq!(reset, 1);

        let (a, b) = tokio::join!(render(&c), render(&c));
        assert!(a.contains("app_idle -1\n"), "{a}");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn output_matches_prometheus_client() {
        use prometheus::{Encoder, TextEncoder};

        let reg = prometheus::Registry::new();
        let reference = prometheus::CounterVec::new(
            prometheus::Opts::new("requests_total", "Requests served.").namespace("app"),
            &["method"],
        )
        .unwrap();
        let reference_lat = prometheus::HistogramVec::new(
            prometheus::HistogramOpts::new("latency_seconds", "Latency.")
                .namespace("app")
                .buckets(vec![0.5, 1.0]),
            &["method"],
        )
        .unwrap();
        reg.register(Box::new(reference.clone())).unwrap();
        reg.register(Box::new(reference_lat.clone())).unwrap();

        let c = collector("app");
        let ours = c
            .counter(MetricOpts::new("requests_total").help("Requests served."))
            .unwrap();
        let ours_lat = c
            .histogram(
                HistogramOpts::from(MetricOpts::new("latency_seconds").help("Latency."))
                    .buckets(Buckets::explicit(vec![0.5, 1.0])),
            )
            .unwrap();

        for (method, n, v) in [("get", 3.0, 0.25), ("post", 1.0, 3.0)] {
            reference.with_label_values(&[method]).inc_by(n);
            reference_lat.with_label_values(&[method]).observe(v);
            ours.add(n, &LabelSet::from([("method", method)])).unwrap();
            ours_lat.observe(v, &LabelSet::from([("method", method)])).unwrap();
        }
        reference_lat.with_label_values(&["get"]).observe(0.5);
        ours_lat.observe(0.5, &LabelSet::from([("method", "get")])).unwrap();

        let mut buf = Vec::new();
        TextEncoder::new().encode(&reg.gather(), &mut buf).unwrap();
        let expected = String::from_utf8(buf).unwrap();

        assert_eq!(render(&c).await, expected);
    }
}
