//! # trafficlog
//!
//! HTTP traffic logging middleware.
//!
//! Every request and response passing through a [`TrafficLoggerLayer`] is
//! checked against a rule list. Included traffic produces two records, one
//! per phase, that share a request log id. Which headers and bodies each
//! record carries is decided per verb and per response status.
//!
//! ## Features
//!
//! - `config` - build a layer from `TRAFFIC_LOG_*` environment variables and
//!   `.env` files (enabled by default)
//!
//! ## Example
//!
//! ```rust
//! use trafficlog::{FileSink, JsonFormatter, Token, TrafficLoggerLayer};
//!
//! let layer = TrafficLoggerLayer::builder()
//!     .tokens(["headers", "get", "post"])
//!     .token(Token::map([("post", "request_bodies")]))
//!     .token(Token::map([(Token::from(500u16..600u16), Token::from("response_bodies"))]))
//!     .formatter(JsonFormatter::new())
//!     .sink(FileSink::new("log/traffic.log"))
//!     .build()
//!     .unwrap();
//! # let _ = layer;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod format;
pub mod middleware;
pub mod sink;

// Environment configuration module
#[cfg(feature = "config")]
pub mod config;

pub use format::{Formatter, JsonFormatter, StreamFormatter};
pub use middleware::{MiddlewareLayer, TrafficLoggerBuilder, TrafficLoggerLayer};
pub use sink::{FileSink, MemorySink, Sink, WriterSink};

#[cfg(feature = "config")]
pub use config::{OutputFormat, SettingsError, TrafficLogSettings};

pub use trafficlog_core::{
    Body, CapturedBody, ConfigError, Decision, Facet, FacetSet, PhaseRecord, RequestLogId,
    Ruleset, SinkError, Token,
};
