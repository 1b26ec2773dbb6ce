//! Environment configuration
//!
//! Reads `TRAFFIC_LOG_*` variables, optionally seeded from a `.env` file:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `TRAFFIC_LOG_RULES` | JSON token list | `[]` |
//! | `TRAFFIC_LOG_FORMAT` | `json` or `stream` | `json` |
//! | `TRAFFIC_LOG_PATH` | file to append to | stdout |
//! | `TRAFFIC_LOG_COLOR` | colored stream output | `false` |
//! | `TRAFFIC_LOG_PRETTY` | pretty JSON output or re-indented bodies | `false` |
//!
//! # Example
//!
//! ```ignore
//! use trafficlog::config::{load_dotenv, TrafficLogSettings};
//!
//! load_dotenv();
//! let layer = TrafficLogSettings::from_env()?.into_layer()?;
//! ```

use crate::format::{JsonFormatter, StreamFormatter};
use crate::middleware::TrafficLoggerLayer;
use crate::sink::{FileSink, WriterSink};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use trafficlog_core::{ConfigError, Ruleset};

/// Prefix shared by all variables.
pub const ENV_PREFIX: &str = "TRAFFIC_LOG_";

/// Error type for settings loading failures.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Environment variable deserialization failed.
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),

    /// The rule list was rejected.
    #[error("invalid TRAFFIC_LOG_RULES: {0}")]
    Rules(#[from] ConfigError),
}

/// Output format selected by `TRAFFIC_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON lines
    #[default]
    Json,
    /// Human readable stream
    Stream,
}

/// Logger settings from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrafficLogSettings {
    /// JSON token list
    #[serde(default)]
    pub rules: Option<String>,
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
    /// Append to this file instead of stdout
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Colored stream output
    #[serde(default)]
    pub color: bool,
    /// Pretty JSON output, or re-indented JSON bodies in stream output
    #[serde(default)]
    pub pretty: bool,
}

impl TrafficLogSettings {
    /// Read `TRAFFIC_LOG_*` variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env::<Self>()?)
    }

    /// Read settings from arbitrary key/value pairs, with the prefix.
    pub fn from_vars<I>(vars: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, Self>(vars)?)
    }

    /// Resolve the configured rules.
    pub fn ruleset(&self) -> Result<Ruleset, SettingsError> {
        match self.rules.as_deref().map(str::trim) {
            None | Some("") => Ok(Ruleset::default()),
            Some(source) => Ok(Ruleset::from_json_str(source)?),
        }
    }

    /// Build a logger layer from these settings.
    pub fn into_layer(self) -> Result<TrafficLoggerLayer, SettingsError> {
        let builder = TrafficLoggerLayer::builder().ruleset(self.ruleset()?);
        let builder = match self.format {
            OutputFormat::Json => builder.formatter(JsonFormatter {
                pretty: self.pretty,
            }),
            OutputFormat::Stream => builder.formatter(StreamFormatter {
                color: self.color,
                pretty_print: self.pretty,
            }),
        };
        let builder = match self.path {
            Some(path) => builder.sink(FileSink::new(path)),
            None => builder.sink(WriterSink::stdout()),
        };
        Ok(builder.build()?)
    }
}

/// Load environment variables from a `.env` file.
///
/// A missing file is not an error; variables already set take precedence.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Load environment variables from a specific file path.
pub fn load_dotenv_from<P: AsRef<std::path::Path>>(path: P) {
    let _ = dotenvy::from_path(path);
}
