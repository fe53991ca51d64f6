use tally_model::ExpositionFormat;

use crate::error::ProducerFailure;

/// Result of one [`Collector::collect`](super::Collector::collect) pass.
#[derive(Debug, Clone)]
pub struct Collection {
    format: ExpositionFormat,
    text: String,
    failures: Vec<ProducerFailure>,
}

impl Collection {
    pub(crate) fn new(format: ExpositionFormat, text: String, failures: Vec<ProducerFailure>) -> Self {
        Self {
            format,
            text,
            failures,
        }
    }

    /// Rendered exposition text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// HTTP `Content-Type` matching [`Collection::text`].
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// Producers that failed; their metrics are missing from the text.
    pub fn failures(&self) -> &[ProducerFailure] {
        &self.failures
    }

    /// `true` if every triggered producer succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
