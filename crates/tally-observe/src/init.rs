use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::LoggerConfig,
    error::{LoggerError, LoggerResult},
    format::LogFormat,
    timer::UtcRfc3339,
};

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadyInitialized`] when called twice.
///
/// ```rust
/// use tally_observe::{LoggerConfig, init_logger};
///
/// init_logger(&LoggerConfig::default()).unwrap();
/// tracing::info!("logger ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    let filter = cfg.filter.to_env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    match cfg.format {
        LogFormat::Text => install(
            registry.with(
                fmt::layer()
                    .with_ansi(cfg.ansi())
                    .with_target(cfg.with_targets)
                    .with_timer(UtcRfc3339),
            ),
        ),
        LogFormat::Json => install(
            registry.with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_target(cfg.with_targets)
                    .with_timer(UtcRfc3339),
            ),
        ),
        LogFormat::Journald => install(registry.with(journald()?)),
    }
}

#[cfg(target_os = "linux")]
fn journald() -> LoggerResult<tracing_journald::Layer> {
    tracing_journald::layer().map_err(|e| LoggerError::Journald(e.to_string()))
}

#[cfg(not(target_os = "linux"))]
fn journald() -> LoggerResult<tracing_subscriber::layer::Identity> {
    Err(LoggerError::JournaldNotSupported)
}

fn install<S>(subscriber: S) -> LoggerResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}
