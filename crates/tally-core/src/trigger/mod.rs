//! Triggered metrics: producers that refresh a family on demand during
//! collection instead of being updated continuously by application code.
mod registry;
pub(crate) use registry::TriggerRegistry;

use std::{future::Future, sync::Arc};

use async_trait::async_trait;

use crate::error::ProducerError;

/// Deferred producer invoked once per collection.
///
/// The producer writes into the family it was registered for (typically through
/// a handle it captured) and resolves with `Ok(())`, or with an error which
/// keeps that family out of the current collection.
#[async_trait]
pub trait Trigger: Send + Sync + 'static {
    /// Producer name used in logs.
    fn name(&self) -> &str {
        "trigger"
    }

    async fn trigger(&self) -> Result<(), ProducerError>;
}

/// [`Trigger`] backed by an async closure.
pub struct TriggerFn<F> {
    name: String,
    f: F,
}

impl<F, Fut> TriggerFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProducerError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Build a shared trigger, ready for registration.
    pub fn arc(name: impl Into<String>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Trigger for TriggerFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProducerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn trigger(&self) -> Result<(), ProducerError> {
        (self.f)().await
    }
}
