//! Folding configuration tokens into a [`Ruleset`]

use super::token::Token;
use crate::error::{ConfigError, ConfigResult};
use crate::rules::{
    parse_verb, Facet, FacetPatch, FacetSet, Guard, Rule, RuleEffect, Ruleset, StatusCondition,
    StatusMatcher, VerbCondition,
};
use http::Method;
use std::ops::Range;

const ONLY: &str = "only";

/// What a mapping key stands for.
enum Key {
    Only,
    Facets(&'static [Facet]),
    Guard(Guard),
}

/// Mutable builder that turns tokens into an immutable [`Ruleset`].
///
/// Tokens are folded left to right. Every validation happens here, so
/// resolving a finished ruleset can never fail.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    base: FacetSet,
    verbs: Vec<Method>,
    statuses: Vec<StatusMatcher>,
    only: Option<Vec<Guard>>,
    rules: Vec<Rule>,
}

impl ConfigResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one top-level token into the builder.
    pub fn push(&mut self, token: Token) -> ConfigResult<()> {
        match token {
            Token::Symbol(symbol) => self.push_symbol(&symbol),
            Token::Int(n) => {
                self.statuses.push(StatusMatcher::Code(status_code(n)?));
                Ok(())
            }
            range @ Token::Range { .. } => {
                self.statuses.push(StatusMatcher::Range(status_range(&range)?));
                Ok(())
            }
            Token::List(items) => items.into_iter().try_for_each(|item| self.push(item)),
            Token::Map(entries) => self.push_mapping(&Guard::any(), entries),
            other => Err(ConfigError::UnsupportedToken {
                position: "top-level token",
                found: other.describe(),
            }),
        }
    }

    /// Freeze the builder.
    pub fn finish(self) -> Ruleset {
        let verb_filter = if self.verbs.is_empty() {
            VerbCondition::Any
        } else {
            VerbCondition::one_of(self.verbs)
        };
        let status_filter = if self.statuses.is_empty() {
            StatusCondition::Any
        } else {
            StatusCondition::OneOf(self.statuses)
        };

        Ruleset {
            base: self.base,
            verb_filter,
            status_filter,
            only: self.only,
            rules: self.rules,
        }
    }

    fn push_symbol(&mut self, symbol: &str) -> ConfigResult<()> {
        if let Some(facets) = Facet::expand(symbol) {
            for facet in facets {
                self.base.set(*facet, true);
            }
            return Ok(());
        }
        if let Some(verb) = parse_verb(symbol) {
            if !self.verbs.contains(&verb) {
                self.verbs.push(verb);
            }
            return Ok(());
        }
        if symbol.eq_ignore_ascii_case(ONLY) {
            return Err(ConfigError::UnsupportedToken {
                position: "top-level token",
                found: "bare `only` (use it as a mapping key)".to_string(),
            });
        }
        Err(ConfigError::UnknownSymbol(symbol.to_string()))
    }

    fn push_mapping(&mut self, outer: &Guard, entries: Vec<(Token, Token)>) -> ConfigResult<()> {
        for (key, value) in entries {
            match classify_key(key)? {
                Key::Only => match value {
                    Token::Map(inner) => self.push_only(outer, inner)?,
                    other => return Err(ConfigError::InvalidOnly(other.describe())),
                },
                Key::Facets(facets) => {
                    let patch = facet_key_patch(facets, value)?;
                    self.rules.push(Rule {
                        guard: outer.clone(),
                        effect: RuleEffect::Override(patch),
                    });
                }
                Key::Guard(guard) => self.push_value(&outer.and(&guard), value)?,
            }
        }
        Ok(())
    }

    fn push_only(&mut self, outer: &Guard, entries: Vec<(Token, Token)>) -> ConfigResult<()> {
        for (key, value) in entries {
            let guard = match classify_key(key)? {
                Key::Guard(guard) => outer.and(&guard),
                Key::Only => {
                    return Err(ConfigError::UnsupportedToken {
                        position: "`only` key",
                        found: "nested `only`".to_string(),
                    })
                }
                Key::Facets(facets) => {
                    return Err(ConfigError::UnsupportedToken {
                        position: "`only` key",
                        found: format!("facet `{}`", facets[0]),
                    })
                }
            };
            self.only.get_or_insert_with(Vec::new).push(guard.clone());
            self.push_value(&guard, value)?;
        }
        Ok(())
    }

    fn push_value(&mut self, guard: &Guard, value: Token) -> ConfigResult<()> {
        let effect = match value {
            Token::Bool(false) => RuleEffect::Exclude,
            Token::Bool(true) => RuleEffect::Override(FacetPatch::empty()),
            Token::Map(inner) => return self.push_mapping(guard, inner),
            other @ (Token::Symbol(_) | Token::List(_)) => {
                RuleEffect::Override(FacetPatch::grant(facet_list(&other)?))
            }
            other => {
                return Err(ConfigError::UnsupportedToken {
                    position: "mapping value",
                    found: other.describe(),
                })
            }
        };
        self.rules.push(Rule {
            guard: guard.clone(),
            effect,
        });
        Ok(())
    }
}

fn classify_key(key: Token) -> ConfigResult<Key> {
    match key {
        Token::Symbol(symbol) => {
            if symbol.eq_ignore_ascii_case(ONLY) {
                Ok(Key::Only)
            } else if let Some(facets) = Facet::expand(&symbol) {
                Ok(Key::Facets(facets))
            } else if let Some(verb) = parse_verb(&symbol) {
                Ok(Key::Guard(Guard {
                    verbs: VerbCondition::one_of([verb]),
                    statuses: StatusCondition::Any,
                }))
            } else {
                Err(ConfigError::UnknownSymbol(symbol))
            }
        }
        Token::Int(n) => Ok(Key::Guard(Guard {
            verbs: VerbCondition::Any,
            statuses: StatusCondition::OneOf(vec![StatusMatcher::Code(status_code(n)?)]),
        })),
        range @ Token::Range { .. } => Ok(Key::Guard(Guard {
            verbs: VerbCondition::Any,
            statuses: StatusCondition::OneOf(vec![StatusMatcher::Range(status_range(&range)?)]),
        })),
        Token::List(items) => {
            let mut verbs = Vec::new();
            let mut statuses = Vec::new();
            for item in items {
                match item {
                    Token::Symbol(symbol) => match parse_verb(&symbol) {
                        Some(verb) => verbs.push(verb),
                        None => return Err(ConfigError::UnknownSymbol(symbol)),
                    },
                    Token::Int(n) => statuses.push(StatusMatcher::Code(status_code(n)?)),
                    range @ Token::Range { .. } => {
                        statuses.push(StatusMatcher::Range(status_range(&range)?))
                    }
                    other => {
                        return Err(ConfigError::UnsupportedToken {
                            position: "mapping key list element",
                            found: other.describe(),
                        })
                    }
                }
            }
            Ok(Key::Guard(Guard {
                verbs: if verbs.is_empty() {
                    VerbCondition::Any
                } else {
                    VerbCondition::one_of(verbs)
                },
                statuses: if statuses.is_empty() {
                    StatusCondition::Any
                } else {
                    StatusCondition::OneOf(statuses)
                },
            }))
        }
        other => Err(ConfigError::UnsupportedToken {
            position: "mapping key",
            found: other.describe(),
        }),
    }
}

/// Patch for a facet used as a mapping key.
fn facet_key_patch(facets: &'static [Facet], value: Token) -> ConfigResult<FacetPatch> {
    let mut patch = FacetPatch::empty();
    match value {
        Token::Bool(enabled) => {
            for facet in facets {
                patch.set(*facet, enabled);
            }
        }
        value @ (Token::Symbol(_) | Token::List(_)) => {
            let extra = facet_list(&value).map_err(|_| ConfigError::InvalidFacetValue {
                facet: facets_name(facets),
                found: value.describe(),
            })?;
            for facet in facets.iter().copied().chain(extra) {
                patch.set(facet, true);
            }
        }
        other => {
            return Err(ConfigError::InvalidFacetValue {
                facet: facets_name(facets),
                found: other.describe(),
            })
        }
    }
    Ok(patch)
}

fn facets_name(facets: &[Facet]) -> String {
    let names: Vec<&str> = facets.iter().map(Facet::as_str).collect();
    names.join("+")
}

/// Facets named by a symbol or a list of symbols.
fn facet_list(token: &Token) -> ConfigResult<Vec<Facet>> {
    let symbols: Vec<&Token> = match token {
        Token::List(items) => items.iter().collect(),
        single => vec![single],
    };

    let mut facets = Vec::new();
    for symbol in symbols {
        match symbol {
            Token::Symbol(name) => match Facet::expand(name) {
                Some(expanded) => facets.extend_from_slice(expanded),
                None => return Err(ConfigError::UnknownSymbol(name.clone())),
            },
            other => {
                return Err(ConfigError::UnsupportedToken {
                    position: "facet list element",
                    found: other.describe(),
                })
            }
        }
    }
    Ok(facets)
}

fn status_code(n: i64) -> ConfigResult<u16> {
    match u16::try_from(n) {
        Ok(code) if (100..=599).contains(&code) => Ok(code),
        _ => Err(ConfigError::InvalidStatus(n)),
    }
}

/// Normalize a range token to a half-open range within 100..600.
fn status_range(token: &Token) -> ConfigResult<Range<u16>> {
    let Token::Range {
        start,
        end,
        inclusive,
    } = *token
    else {
        return Err(ConfigError::InvalidRange(token.to_string()));
    };

    let end = if inclusive { end.saturating_add(1) } else { end };
    if start < 100 || end > 600 || start >= end {
        return Err(ConfigError::InvalidRange(token.to_string()));
    }
    // Both bounds are within 100..=600 here.
    Ok(start as u16..end as u16)
}
