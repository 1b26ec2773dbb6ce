//! Configuration tokens
//!
//! The configuration surface is a heterogeneous list: facet and verb symbols,
//! status codes, status ranges and mappings of those to overrides. [`Token`]
//! is the closed set of shapes such a list may contain.

use crate::error::ConfigError;
use std::fmt;
use std::ops::{Range, RangeInclusive};

/// One element of a logger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A facet, aggregate, verb or `only` symbol
    Symbol(String),
    /// `true` or `false`, valid only as a mapping value
    Bool(bool),
    /// A status code
    Int(i64),
    /// A range of status codes
    Range {
        /// First code in the range
        start: i64,
        /// Upper bound of the range
        end: i64,
        /// Whether `end` itself is part of the range
        inclusive: bool,
    },
    /// A list of tokens
    List(Vec<Token>),
    /// Key/value pairs, in encounter order
    Map(Vec<(Token, Token)>),
}

impl Token {
    /// Build a mapping token.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Token>,
        V: Into<Token>,
    {
        Token::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Interpret text the way a configuration file would.
    ///
    /// Integers become status codes, `a...b` a half-open range, `a..b` an
    /// inclusive range, and anything else a symbol.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Ok(n) = text.parse::<i64>() {
            return Token::Int(n);
        }
        for (separator, inclusive) in [("...", false), ("..", true)] {
            if let Some((start, end)) = text.split_once(separator) {
                if let (Ok(start), Ok(end)) = (start.trim().parse(), end.trim().parse()) {
                    return Token::Range {
                        start,
                        end,
                        inclusive,
                    };
                }
            }
        }
        Token::Symbol(text.to_string())
    }

    /// Short human description, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Symbol(s) => format!("symbol `{}`", s),
            Token::Bool(b) => format!("boolean {}", b),
            Token::Int(n) => format!("integer {}", n),
            Token::Range { .. } => format!("range {}", self),
            Token::List(_) => "list".to_string(),
            Token::Map(_) => "mapping".to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Symbol(s) => f.write_str(s),
            Token::Bool(b) => write!(f, "{}", b),
            Token::Int(n) => write!(f, "{}", n),
            Token::Range {
                start,
                end,
                inclusive,
            } => {
                let separator = if *inclusive { ".." } else { "..." };
                write!(f, "{}{}{}", start, separator, end)
            }
            Token::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Token::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{} => {}", k, v))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::parse(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token::parse(&s)
    }
}

impl From<bool> for Token {
    fn from(b: bool) -> Self {
        Token::Bool(b)
    }
}

impl From<u16> for Token {
    fn from(n: u16) -> Self {
        Token::Int(n.into())
    }
}

impl From<i32> for Token {
    fn from(n: i32) -> Self {
        Token::Int(n.into())
    }
}

impl From<i64> for Token {
    fn from(n: i64) -> Self {
        Token::Int(n)
    }
}

impl From<Range<u16>> for Token {
    fn from(r: Range<u16>) -> Self {
        Token::Range {
            start: r.start.into(),
            end: r.end.into(),
            inclusive: false,
        }
    }
}

impl From<RangeInclusive<u16>> for Token {
    fn from(r: RangeInclusive<u16>) -> Self {
        Token::Range {
            start: (*r.start()).into(),
            end: (*r.end()).into(),
            inclusive: true,
        }
    }
}

impl<T: Into<Token>> From<Vec<T>> for Token {
    fn from(items: Vec<T>) -> Self {
        Token::List(items.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<serde_json::Value> for Token {
    type Error = ConfigError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::String(s) => Ok(Token::parse(&s)),
            Value::Bool(b) => Ok(Token::Bool(b)),
            Value::Number(n) => n.as_i64().map(Token::Int).ok_or_else(|| {
                ConfigError::UnsupportedToken {
                    position: "token",
                    found: format!("number {}", n),
                }
            }),
            Value::Array(items) => items
                .into_iter()
                .map(Token::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Token::List),
            Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((Token::parse(&k), Token::try_from(v)?)))
                .collect::<Result<Vec<_>, ConfigError>>()
                .map(Token::Map),
            Value::Null => Err(ConfigError::UnsupportedToken {
                position: "token",
                found: "null".to_string(),
            }),
        }
    }
}
