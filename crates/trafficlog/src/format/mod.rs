//! Record formatters
//!
//! A [`Formatter`] turns one [`PhaseRecord`] into the bytes appended to a
//! sink. Two are provided:
//!
//! - [`JsonFormatter`] - one JSON object per line, machine readable
//! - [`StreamFormatter`] - an HTTP-message-like rendition for humans
//!
//! Any other type implementing [`Formatter`] can be handed to
//! [`TrafficLoggerBuilder::formatter`](crate::TrafficLoggerBuilder::formatter).

mod json;
mod stream;

pub use json::JsonFormatter;
pub use stream::StreamFormatter;

use trafficlog_core::PhaseRecord;

/// Trait for record formatters
///
/// Closures taking a record and returning bytes are formatters too.
pub trait Formatter: Send + Sync + 'static {
    /// Render a record, including any trailing separator.
    fn format(&self, record: &PhaseRecord) -> Vec<u8>;
}

impl<F> Formatter for F
where
    F: Fn(&PhaseRecord) -> Vec<u8> + Send + Sync + 'static,
{
    fn format(&self, record: &PhaseRecord) -> Vec<u8> {
        self(record)
    }
}
