//! Prometheus text exposition format (version 0.0.4).
//!
//! ```text
//! # HELP app_requests_total Requests served.
//! # TYPE app_requests_total counter
//! app_requests_total{method="get"} 3
//! # TYPE app_latency_seconds histogram
//! app_latency_seconds_bucket{le="0.5"} 1
//! app_latency_seconds_bucket{le="+Inf"} 2
//! app_latency_seconds_sum 1.25
//! app_latency_seconds_count 2
//! ```
use std::fmt::{self, Write};

use tally_model::{BUCKET_LABEL, escape_help};

use crate::family::{Accumulator, Family, Metric};

/// Render `families` in iteration order; families without instances are skipped.
pub(crate) fn encode<'a>(families: impl IntoIterator<Item = &'a Metric>) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for metric in families {
        match metric {
            Metric::Counter(c) => write_family(&mut out, c.family(), |out, name, key, s| {
                write_sample(out, name, "", key, None, &format_value(s.value))
            })?,
            Metric::Gauge(g) => write_family(&mut out, g.family(), |out, name, key, s| {
                write_sample(out, name, "", key, None, &format_value(s.value))
            })?,
            Metric::Histogram(h) => {
                let bounds = h.bounds();
                write_family(&mut out, h.family(), |out, name, key, s| {
                    for (bound, count) in bounds.iter().zip(&s.counts) {
                        let le = format_value(*bound);
                        write_sample(out, name, "_bucket", key, Some(le.as_str()), &count.to_string())?;
                    }
                    let count = s.count.to_string();
                    write_sample(out, name, "_bucket", key, Some("+Inf"), &count)?;
                    write_sample(out, name, "_sum", key, None, &format_value(s.sum))?;
                    write_sample(out, name, "_count", key, None, &count)
                })?
            }
        }
    }
    Ok(out)
}

fn write_family<S: Accumulator>(
    out: &mut String,
    family: &Family<S>,
    mut sample: impl FnMut(&mut String, &str, &str, &S) -> fmt::Result,
) -> fmt::Result {
    family.with_instances(|instances| {
        if instances.is_empty() {
            return Ok(());
        }
        let name = family.name();
        if let Some(help) = family.help().filter(|h| !h.is_empty()) {
            writeln!(out, "# HELP {name} {}", escape_help(help))?;
        }
        writeln!(out, "# TYPE {name} {}", S::KIND)?;
        for (key, state) in instances.iter() {
            sample(out, name, key, state)?;
        }
        Ok(())
    })
}

/// One sample line. `key` is the canonical label key, `le` an extra bucket label.
fn write_sample(
    out: &mut String,
    name: &str,
    suffix: &str,
    key: &str,
    le: Option<&str>,
    value: &str,
) -> fmt::Result {
    write!(out, "{name}{suffix}")?;
    match (key.is_empty(), le) {
        (true, None) => {}
        (true, Some(le)) => write!(out, "{{{BUCKET_LABEL}=\"{le}\"}}")?,
        (false, None) => write!(out, "{{{key}}}")?,
        (false, Some(le)) => write!(out, "{{{key},{BUCKET_LABEL}=\"{le}\"}}")?,
    }
    writeln!(out, " {value}")
}

/// Float rendering understood by Prometheus parsers.
pub(crate) fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}
