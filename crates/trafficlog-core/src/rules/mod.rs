//! Rule model and decision engine
//!
//! A [`Ruleset`] answers, for one verb and an optional status, whether traffic
//! is logged and which [`FacetSet`] is captured. It is evaluated twice per
//! traffic pair: at request time with the status unknown and again once the
//! response status is known.

mod condition;
mod facet;
mod ruleset;

pub use condition::{
    parse_verb, Guard, GuardMatch, StatusCondition, StatusMatcher, VerbCondition,
};
pub use facet::{Facet, FacetPatch, FacetSet};
pub use ruleset::{Decision, Rule, RuleEffect, Ruleset};
