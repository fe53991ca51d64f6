use std::{sync::Arc, sync::Mutex, sync::RwLock, time::Duration};

use tokio::time::Instant;
use tracing::{trace, warn};

use super::Trigger;
use crate::{
    error::{ProducerError, ProducerFailure},
    sync::{lock, read, write},
};

struct TriggerEntry {
    metric: String,
    producer: Arc<dyn Trigger>,
    /// Minimum time between two successful runs.
    interval: Option<Duration>,
    last_ok: Mutex<Option<Instant>>,
}

impl TriggerEntry {
    fn is_due(&self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return true;
        };
        lock(&self.last_ok).is_none_or(|at| now.saturating_duration_since(at) >= interval)
    }
}

/// Producers registered on a collector; entries live as long as the collector.
#[derive(Default)]
pub(crate) struct TriggerRegistry {
    entries: RwLock<Vec<Arc<TriggerEntry>>>,
}

impl TriggerRegistry {
    pub(crate) fn register(
        &self,
        metric: String,
        producer: Arc<dyn Trigger>,
        interval: Option<Duration>,
    ) {
        write(&self.entries).push(Arc::new(TriggerEntry {
            metric,
            producer,
            interval,
            last_ok: Mutex::new(None),
        }));
    }

    pub(crate) fn len(&self) -> usize {
        read(&self.entries).len()
    }

    /// Run every due producer concurrently and wait for all of them.
    ///
    /// Each producer runs in its own task bounded by `timeout`; errors, timeouts
    /// and panics are captured per producer and returned.
    pub(crate) async fn run(&self, timeout: Duration) -> Vec<ProducerFailure> {
        let now = Instant::now();
        let due: Vec<Arc<TriggerEntry>> = read(&self.entries)
            .iter()
            .filter(|e| e.is_due(now))
            .cloned()
            .collect();

        let handles: Vec<_> = due
            .into_iter()
            .map(|entry| {
                let metric = entry.metric.clone();
                let producer = entry.producer.name().to_string();
                let handle = tokio::spawn(async move {
                    let res = match tokio::time::timeout(timeout, entry.producer.trigger()).await {
                        Ok(res) => res,
                        Err(_) => Err(ProducerError::TimedOut(timeout)),
                    };
                    if res.is_ok() {
                        *lock(&entry.last_ok) = Some(Instant::now());
                    }
                    res
                });
                (metric, producer, handle)
            })
            .collect();

        let mut failures = Vec::new();
        for (metric, producer, handle) in handles {
            let res = match handle.await {
                Ok(res) => res,
                Err(e) if e.is_panic() => Err(ProducerError::Panicked),
                Err(_) => Err(ProducerError::Cancelled),
            };
            match res {
                Ok(()) => trace!(metric = %metric, producer = %producer, "producer finished"),
                Err(error) => {
                    warn!(metric = %metric, producer = %producer, error = %error, "triggered producer failed");
                    failures.push(ProducerFailure { metric, error });
                }
            }
        }
        failures
    }
}
