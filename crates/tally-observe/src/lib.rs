//! Logging setup shared by tally binaries.
//!
//! Installs a global `tracing` subscriber writing text, JSON or journald
//! records, filtered by an `EnvFilter` expression.
mod config;
mod error;
mod filter;
mod format;
mod init;
mod timer;

pub use config::{LOG_ENV, LOG_FORMAT_ENV, LoggerConfig};
pub use error::{LoggerError, LoggerResult};
pub use filter::LogFilter;
pub use format::LogFormat;
pub use init::init_logger;
pub use timer::UtcRfc3339;
