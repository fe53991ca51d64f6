//! Builds a small collector, records a few samples and prints two scrapes.
//!
//! Usage: `tally-dump [collector-config.json]`
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::Context;
use tracing::{info, warn};

use tally_core::prelude::*;
use tally_observe::{LoggerConfig, init_logger};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) logger
    init_logger(&LoggerConfig::default().with_env()?)?;

    // 2) collector
    let cfg: CollectorConfig = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parse {path}"))?
        }
        None => CollectorConfig::default()
            .namespace("demo")
            .label("host", "localhost"),
    };
    let collector = Collector::new(cfg)?;
    info!(namespace = ?collector.namespace(), "collector ready");

    // 3) families
    let requests = collector.counter(
        MetricOpts::new("requests_total")
            .subsystem("http")
            .help("HTTP requests served."),
    )?;
    let latency = collector.histogram(
        HistogramOpts::from(MetricOpts::new("latency_seconds").subsystem("http"))
            .buckets(Buckets::exponential(0.005, 2.0, 8)),
    )?;
    let inflight = collector.gauge(
        GaugeOpts::from(MetricOpts::new("inflight").help("Requests in flight."))
            .expiry(Expiry::new(Duration::from_millis(200), 0.0)),
    )?;
    let uptime = collector.gauge(MetricOpts::new("uptime_ticks").help("Scrapes since start."))?;

    // 4) triggered producer
    let ticks = Arc::new(AtomicU64::new(0));
    let target = uptime.clone();
    collector.add_triggered_metric(
        uptime,
        TriggerFn::arc("uptime", move || {
            let target = target.clone();
            let ticks = ticks.clone();
            async move {
                let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                target.set(n as f64, &LabelSet::new()).map_err(ProducerError::failed)
            }
        }),
        None,
    )?;

    // 5) traffic
    for (i, method) in ["get", "get", "post", "get", "delete"].into_iter().enumerate() {
        let labels = LabelSet::from([("method", method)]);
        requests.increment(&labels)?;
        latency.observe(0.004 * (i as f64 + 1.0), &labels)?;
    }
    inflight.set(3.0, &LabelSet::new())?;

    // 6) scrapes; inflight expires between the two
    for _ in 0..2 {
        let out = collector.collect(ExpositionFormat::Prometheus).await?;
        for failure in out.failures() {
            warn!(%failure, "incomplete scrape");
        }
        println!("# Content-Type: {}", out.content_type());
        print!("{}", out.text());
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    Ok(())
}
