//! JSON lines formatter

use super::Formatter;
use trafficlog_core::PhaseRecord;

/// JSON log formatter
///
/// Emits one object per record followed by a newline. With `pretty` the object
/// spans several lines, which is convenient for eyeballing but no longer
/// parseable line by line.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    /// Whether to pretty print JSON
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pretty-printing JSON formatter
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &PhaseRecord) -> Vec<u8> {
        let rendered = if self.pretty {
            serde_json::to_vec_pretty(record)
        } else {
            serde_json::to_vec(record)
        };
        // Serializing a record only fails on a broken Serialize impl.
        let mut out = rendered.unwrap_or_else(|err| {
            serde_json::to_vec(&serde_json::json!({
                "request_log_id": record.request_log_id,
                "error": format!("failed to render record: {}", err),
            }))
            .unwrap_or_default()
        });
        out.push(b'\n');
        out
    }
}
