//! Verb and status conditions, and the guards built from them

use http::{Method, StatusCode};
use std::fmt;
use std::ops::Range;

/// Verbs accepted as configuration symbols.
const KNOWN_VERBS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

/// Parse a verb symbol, case-insensitively, into its canonical method.
pub fn parse_verb(symbol: &str) -> Option<Method> {
    let upper = symbol.to_ascii_uppercase();
    KNOWN_VERBS.iter().find(|m| m.as_str() == upper).cloned()
}

/// A set of HTTP verbs, or any verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VerbCondition {
    /// Matches every verb
    #[default]
    Any,
    /// Matches only the listed verbs
    OneOf(Vec<Method>),
}

impl VerbCondition {
    /// A condition matching exactly `verbs`.
    pub fn one_of(verbs: impl IntoIterator<Item = Method>) -> Self {
        let mut set = Vec::new();
        for verb in verbs {
            if !set.contains(&verb) {
                set.push(verb);
            }
        }
        VerbCondition::OneOf(set)
    }

    /// Whether `verb` satisfies the condition.
    pub fn matches(&self, verb: &Method) -> bool {
        match self {
            VerbCondition::Any => true,
            VerbCondition::OneOf(verbs) => verbs.contains(verb),
        }
    }

    /// Whether the condition matches every verb.
    pub fn is_any(&self) -> bool {
        matches!(self, VerbCondition::Any)
    }

    /// Intersection of two conditions.
    pub fn and(&self, other: &VerbCondition) -> VerbCondition {
        match (self, other) {
            (VerbCondition::Any, c) | (c, VerbCondition::Any) => c.clone(),
            (VerbCondition::OneOf(a), VerbCondition::OneOf(b)) => {
                VerbCondition::OneOf(a.iter().filter(|v| b.contains(v)).cloned().collect())
            }
        }
    }
}

impl fmt::Display for VerbCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbCondition::Any => f.write_str("any verb"),
            VerbCondition::OneOf(verbs) => {
                let names: Vec<&str> = verbs.iter().map(Method::as_str).collect();
                f.write_str(&names.join("|"))
            }
        }
    }
}

/// A single status code or a half-open range of codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMatcher {
    /// Exactly this code
    Code(u16),
    /// Any code in `start..end`
    Range(Range<u16>),
}

impl StatusMatcher {
    /// Whether `code` satisfies the matcher.
    pub fn matches(&self, code: u16) -> bool {
        match self {
            StatusMatcher::Code(c) => *c == code,
            StatusMatcher::Range(r) => r.contains(&code),
        }
    }
}

impl fmt::Display for StatusMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMatcher::Code(c) => write!(f, "{}", c),
            StatusMatcher::Range(r) => write!(f, "{}...{}", r.start, r.end),
        }
    }
}

/// A set of status codes and ranges, or any status.
///
/// Only meaningful once a response status is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusCondition {
    /// Matches every status, and also an unknown status
    #[default]
    Any,
    /// Matches when any matcher matches
    OneOf(Vec<StatusMatcher>),
    /// Matches when every nested condition matches
    AllOf(Vec<StatusCondition>),
}

impl StatusCondition {
    /// Whether `status` satisfies the condition.
    pub fn matches(&self, status: StatusCode) -> bool {
        let code = status.as_u16();
        match self {
            StatusCondition::Any => true,
            StatusCondition::OneOf(matchers) => matchers.iter().any(|m| m.matches(code)),
            StatusCondition::AllOf(conditions) => conditions.iter().all(|c| c.matches(status)),
        }
    }

    /// Whether the condition matches every status.
    pub fn is_any(&self) -> bool {
        matches!(self, StatusCondition::Any)
    }

    /// Conjunction of two conditions.
    pub fn and(&self, other: &StatusCondition) -> StatusCondition {
        match (self, other) {
            (StatusCondition::Any, c) | (c, StatusCondition::Any) => c.clone(),
            (StatusCondition::AllOf(a), StatusCondition::AllOf(b)) => {
                StatusCondition::AllOf(a.iter().chain(b).cloned().collect())
            }
            (StatusCondition::AllOf(a), c) | (c, StatusCondition::AllOf(a)) => {
                let mut all = a.clone();
                all.push(c.clone());
                StatusCondition::AllOf(all)
            }
            (a, b) => StatusCondition::AllOf(vec![a.clone(), b.clone()]),
        }
    }
}

impl fmt::Display for StatusCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCondition::Any => f.write_str("any status"),
            StatusCondition::OneOf(matchers) => {
                let parts: Vec<String> = matchers.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join("|"))
            }
            StatusCondition::AllOf(conditions) => {
                let parts: Vec<String> = conditions.iter().map(|c| format!("({})", c)).collect();
                f.write_str(&parts.join(" & "))
            }
        }
    }
}

/// Outcome of testing a guard against possibly incomplete traffic facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardMatch {
    /// The guard holds
    Matched,
    /// The guard cannot hold
    NotMatched,
    /// The verb matches but the guard depends on a status not yet known
    Pending,
}

/// A verb condition ANDed with a status condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard {
    /// Verbs the guard accepts
    pub verbs: VerbCondition,
    /// Statuses the guard accepts
    pub statuses: StatusCondition,
}

impl Guard {
    /// A guard accepting all traffic.
    pub fn any() -> Self {
        Self::default()
    }

    /// Conjunction of two guards.
    pub fn and(&self, other: &Guard) -> Guard {
        Guard {
            verbs: self.verbs.and(&other.verbs),
            statuses: self.statuses.and(&other.statuses),
        }
    }

    /// Whether the guard depends on the response status.
    pub fn is_status_scoped(&self) -> bool {
        !self.statuses.is_any()
    }

    /// Test the guard against a verb and, when known, a status.
    pub fn evaluate(&self, verb: &Method, status: Option<StatusCode>) -> GuardMatch {
        if !self.verbs.matches(verb) {
            return GuardMatch::NotMatched;
        }
        if self.statuses.is_any() {
            return GuardMatch::Matched;
        }
        match status {
            Some(status) if self.statuses.matches(status) => GuardMatch::Matched,
            Some(_) => GuardMatch::NotMatched,
            None => GuardMatch::Pending,
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.verbs, self.statuses)
    }
}
