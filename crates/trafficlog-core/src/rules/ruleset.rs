//! The immutable ruleset and the two-phase decision engine

use super::condition::{Guard, GuardMatch, StatusCondition, VerbCondition};
use super::facet::{FacetPatch, FacetSet};
use crate::config::{ConfigResolver, Token};
use crate::error::ConfigResult;
use http::{Method, StatusCode};
use serde::Serialize;
use std::fmt;

/// What a matching rule does to the decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEffect {
    /// Suppress logging of the matching traffic entirely
    Exclude,
    /// Overwrite the facets the patch mentions
    Override(FacetPatch),
}

/// A guard paired with its effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Traffic the rule applies to
    pub guard: Guard,
    /// What happens to matching traffic
    pub effect: RuleEffect,
}

/// The per-phase outcome of evaluating a [`Ruleset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the traffic is logged at all
    pub include: bool,
    /// Facets to capture when included
    pub facets: FacetSet,
    /// Whether inclusion still depends on a response status that is not yet known
    pub awaits_status: bool,
}

impl Decision {
    /// A decision that logs nothing.
    pub fn excluded() -> Self {
        Self {
            include: false,
            facets: FacetSet::NONE,
            awaits_status: false,
        }
    }
}

/// Fully resolved logging configuration.
///
/// Built once by [`ConfigResolver`] and never mutated afterwards, so it can be
/// shared between concurrent requests without synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ruleset {
    pub(crate) base: FacetSet,
    pub(crate) verb_filter: VerbCondition,
    pub(crate) status_filter: StatusCondition,
    pub(crate) only: Option<Vec<Guard>>,
    pub(crate) rules: Vec<Rule>,
}

impl Ruleset {
    /// Resolve a list of configuration tokens.
    ///
    /// # Example
    ///
    /// ```
    /// use trafficlog_core::{Ruleset, Token};
    ///
    /// let rules = Ruleset::new([Token::from("headers"), Token::from(404u16)]).unwrap();
    /// assert!(rules.base().request_headers);
    /// ```
    pub fn new<I, T>(tokens: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        let mut resolver = ConfigResolver::new();
        for token in tokens {
            resolver.push(token.into())?;
        }
        Ok(resolver.finish())
    }

    /// Resolve a JSON array of tokens (or a single token).
    pub fn from_json(value: serde_json::Value) -> ConfigResult<Self> {
        match Token::try_from(value)? {
            Token::List(tokens) => Self::new(tokens),
            token => Self::new([token]),
        }
    }

    /// Parse and resolve a JSON document of tokens.
    pub fn from_json_str(source: &str) -> ConfigResult<Self> {
        Self::from_json(serde_json::from_str(source)?)
    }

    /// Facets selected for all included traffic before rules apply.
    pub fn base(&self) -> FacetSet {
        self.base
    }

    /// Global verb filter.
    pub fn verb_filter(&self) -> &VerbCondition {
        &self.verb_filter
    }

    /// Global status filter.
    pub fn status_filter(&self) -> &StatusCondition {
        &self.status_filter
    }

    /// Alternatives of the `only` restriction, if configured.
    pub fn only(&self) -> Option<&[Guard]> {
        self.only.as_deref()
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Decide what to log for `verb`, with `status` once the response exists.
    ///
    /// With `status` unknown, status-scoped rules are skipped and status-scoped
    /// gates are reported through [`Decision::awaits_status`] instead of
    /// failing.
    pub fn resolve(&self, verb: &Method, status: Option<StatusCode>) -> Decision {
        let mut awaits_status = false;

        if let Some(only) = &self.only {
            let mut pending = false;
            let mut matched = false;
            for guard in only {
                match guard.evaluate(verb, status) {
                    GuardMatch::Matched => {
                        matched = true;
                        break;
                    }
                    GuardMatch::Pending => pending = true,
                    GuardMatch::NotMatched => {}
                }
            }
            if !matched {
                if !pending {
                    return Decision::excluded();
                }
                awaits_status = true;
            }
        }

        if !self.verb_filter.matches(verb) {
            return Decision::excluded();
        }

        if !self.status_filter.is_any() {
            match status {
                Some(status) if !self.status_filter.matches(status) => {
                    return Decision::excluded();
                }
                Some(_) => {}
                None => awaits_status = true,
            }
        }

        let mut facets = self.base;
        for rule in &self.rules {
            match (rule.guard.evaluate(verb, status), &rule.effect) {
                (GuardMatch::Matched, RuleEffect::Exclude) => return Decision::excluded(),
                (GuardMatch::Matched, RuleEffect::Override(patch)) => patch.apply(&mut facets),
                (GuardMatch::Pending, RuleEffect::Exclude) => awaits_status = true,
                _ => {}
            }
        }

        Decision {
            include: true,
            facets,
            awaits_status,
        }
    }
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base: Vec<&str> = self.base.iter().map(|facet| facet.as_str()).collect();
        writeln!(f, "base facets: [{}]", base.join(", "))?;
        writeln!(f, "verb filter: {}", self.verb_filter)?;
        writeln!(f, "status filter: {}", self.status_filter)?;
        if let Some(only) = &self.only {
            for guard in only {
                writeln!(f, "only: {}", guard)?;
            }
        }
        for (i, rule) in self.rules.iter().enumerate() {
            match &rule.effect {
                RuleEffect::Exclude => writeln!(f, "rule {}: {} => exclude", i + 1, rule.guard)?,
                RuleEffect::Override(patch) => {
                    let fields: Vec<String> = super::facet::Facet::ALL
                        .iter()
                        .filter_map(|facet| patch.get(*facet).map(|v| format!("{}={}", facet, v)))
                        .collect();
                    writeln!(f, "rule {}: {} => {{{}}}", i + 1, rule.guard, fields.join(", "))?
                }
            }
        }
        Ok(())
    }
}
