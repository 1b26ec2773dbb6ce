//! Error types for trafficlog
//!
//! Three failure families exist and each has its own propagation policy:
//!
//! | Error | Raised | Handling |
//! |-------|--------|----------|
//! | [`ConfigError`] | while resolving configuration tokens | aborts construction of the logger |
//! | [`CaptureError`] | while reading or decoding a body | recorded in the phase record's `error` field |
//! | [`SinkError`] | while appending a rendered record | surfaced by the caller, never retried |

use thiserror::Error;

/// Result type alias for configuration resolution
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Invalid logger configuration.
///
/// Always raised at construction time, never while serving traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A symbol that is neither a facet, a verb nor `only`
    #[error("unknown configuration symbol `{0}`")]
    UnknownSymbol(String),

    /// A token of a type that is not accepted in this position
    #[error("unsupported {position}: {found}")]
    UnsupportedToken {
        /// Where the token appeared (top level, map key, map value)
        position: &'static str,
        /// Short description of the offending token
        found: String,
    },

    /// An integer outside the valid HTTP status range
    #[error("invalid status code {0}; expected 100..=599")]
    InvalidStatus(i64),

    /// An empty, inverted or out-of-bounds range
    #[error("invalid status range {0}")]
    InvalidRange(String),

    /// A facet key paired with something other than a boolean
    #[error("facet `{facet}` expects true or false, got {found}")]
    InvalidFacetValue {
        /// The facet symbol used as a key
        facet: String,
        /// Short description of the offending value
        found: String,
    },

    /// The value of an `only` key was not a mapping
    #[error("`only` expects a mapping, got {0}")]
    InvalidOnly(String),

    /// A configuration document that could not be parsed
    #[error("malformed configuration document: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Malformed(err.to_string())
    }
}

/// A body could not be read or decoded.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Reading the underlying body source failed
    #[error("failed to read body: {0}")]
    Io(#[from] std::io::Error),

    /// The body claimed a content encoding it was not valid for
    #[error("failed to decode {encoding} body: {source}")]
    Decode {
        /// The content encoding that was attempted
        encoding: &'static str,
        /// The decoder failure
        #[source]
        source: std::io::Error,
    },
}

/// A rendered record could not be appended to its sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination rejected the write
    #[error("failed to write log record: {0}")]
    Io(#[from] std::io::Error),

    /// Another writer panicked while holding the sink
    #[error("log sink is poisoned")]
    Poisoned,
}
