//! # trafficlog-core
//!
//! Framework-independent building blocks of the trafficlog HTTP traffic logger.
//!
//! - [`config`] - the token list a logger is configured with, and its resolver
//! - [`rules`] - the resolved [`Ruleset`] and its two-phase [`Decision`]s
//! - [`capture`] - reading bodies without disturbing the next consumer
//! - [`correlator`] - ids that pair a request record with its response record
//! - [`record`] - the [`PhaseRecord`] handed to formatters
//!
//! ## Example
//!
//! ```rust
//! use http::{Method, StatusCode};
//! use trafficlog_core::{Facet, Ruleset};
//!
//! let rules = Ruleset::from_json_str(r#"["headers", {"post": "request_bodies"}, {"404": false}]"#)
//!     .unwrap();
//!
//! let decision = rules.resolve(&Method::POST, None);
//! assert!(decision.include);
//! assert!(decision.facets.contains(Facet::RequestBodies));
//!
//! let decision = rules.resolve(&Method::GET, Some(StatusCode::NOT_FOUND));
//! assert!(!decision.include);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod capture;
pub mod config;
pub mod correlator;
pub mod error;
pub mod record;
pub mod rules;

pub use capture::{capture, Body, BodyProxy, CapturedBody, ContentEncoding};
pub use config::{ConfigResolver, Token};
pub use correlator::RequestLogId;
pub use error::{CaptureError, ConfigError, ConfigResult, SinkError};
pub use record::{EventKind, PhaseDetail, PhaseRecord, RequestLine, StatusLine};
pub use rules::{Decision, Facet, FacetSet, Guard, Ruleset};
