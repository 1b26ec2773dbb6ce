//! Configuration surface
//!
//! A logger is configured with an ordered list of [`Token`]s:
//!
//! ```text
//! ["headers", "get", "post", 404, "500...600",
//!  {"post": "request_bodies", "delete": false},
//!  {"only": {"put": "all"}}]
//! ```
//!
//! - facet symbols (`request_headers`, `response_headers`, `request_bodies`,
//!   `response_bodies`, `headers`, `bodies`, `all`) select facets for all traffic
//! - verb symbols restrict logging to those verbs
//! - status codes and ranges restrict logging to those statuses
//! - mappings attach overrides (`false` excludes, facet symbols grant) to
//!   verbs, statuses and ranges, and nest to combine guards
//! - `only` lists the sole traffic that is ever logged
//!
//! [`ConfigResolver`] validates the whole list eagerly; see
//! [`Ruleset::new`](crate::Ruleset::new).

mod resolver;
mod token;

pub use resolver::ConfigResolver;
pub use token::Token;
