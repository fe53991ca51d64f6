use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{error::LoggerResult, filter::LogFilter, format::LogFormat};

/// Environment variable overriding [`LoggerConfig::filter`].
pub const LOG_ENV: &str = "TALLY_LOG";
/// Environment variable overriding [`LoggerConfig::format`].
pub const LOG_FORMAT_ENV: &str = "TALLY_LOG_FORMAT";

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    pub format: LogFormat,
    pub filter: LogFilter,
    /// Include the event target (module path).
    pub with_targets: bool,
    /// Allow ANSI colors; only honored when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: LogFilter::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Apply `TALLY_LOG` and `TALLY_LOG_FORMAT` on top of `self`.
    pub fn with_env(self) -> LoggerResult<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> LoggerResult<Self> {
        if let Some(filter) = var(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            self.filter = filter.parse()?;
        }
        if let Some(format) = var(LOG_FORMAT_ENV).filter(|v| !v.trim().is_empty()) {
            self.format = format.parse()?;
        }
        Ok(self)
    }

    pub(crate) fn ansi(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}
