use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use crate::core::feature::SequenceFeature;
use crate::matching::condition::MatchParseError;
use crate::matching::feature_matcher::{MatchCondition, QUOTE};

const AND: &str = "AND";
const OR: &str = "OR";

/// Byte offset of the `)` closing a clause, skipping brackets inside quoted
/// fields. A quote opens a field only at the start of one.
fn clause_end(clause: &str) -> Option<usize> {
    let mut quoted = false;
    let mut previous: Option<char> = None;
    let mut chars = clause.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if quoted {
            if c == QUOTE {
                if chars.peek().is_some_and(|&(_, next)| next == QUOTE) {
                    chars.next();
                } else {
                    quoted = false;
                }
            }
        } else if c == QUOTE && previous.map_or(true, |p| p.is_whitespace() || p == '(') {
            quoted = true;
        } else if c == ')' {
            return Some(i);
        }
        previous = Some(c);
    }
    None
}

/// Adding a condition with the other conjunction to a chain of two or more
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Can't add an {adding} to {existing} conditions")]
    MixedConjunction {
        adding: &'static str,
        existing: &'static str,
    },
}

/// Conditions combined by AND (`All`) or by OR (`Any`), never both.
///
/// The empty expression matches every feature. While an expression holds at
/// most one condition its conjunction can still change; after that, adding
/// with the other conjunction is an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchExpression {
    All(Vec<MatchCondition>),
    Any(Vec<MatchCondition>),
}

impl Default for MatchExpression {
    fn default() -> Self {
        Self::All(Vec::new())
    }
}

impl MatchExpression {
    /// The empty expression
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_of(conditions: impl IntoIterator<Item = MatchCondition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    pub fn any_of(conditions: impl IntoIterator<Item = MatchCondition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Add a condition to an AND chain
    pub fn and(&mut self, condition: MatchCondition) -> Result<(), ExpressionError> {
        match self {
            Self::All(conditions) => conditions.push(condition),
            Self::Any(conditions) if conditions.len() > 1 => {
                return Err(ExpressionError::MixedConjunction {
                    adding: AND,
                    existing: OR,
                });
            }
            Self::Any(conditions) => {
                let mut conditions = std::mem::take(conditions);
                conditions.push(condition);
                *self = Self::All(conditions);
            }
        }
        Ok(())
    }

    /// Add a condition to an OR chain
    pub fn or(&mut self, condition: MatchCondition) -> Result<(), ExpressionError> {
        match self {
            Self::Any(conditions) => conditions.push(condition),
            Self::All(conditions) if conditions.len() > 1 => {
                return Err(ExpressionError::MixedConjunction {
                    adding: OR,
                    existing: AND,
                });
            }
            Self::All(conditions) => {
                let mut conditions = std::mem::take(conditions);
                conditions.push(condition);
                *self = Self::Any(conditions);
            }
        }
        Ok(())
    }

    /// Parse stored expression text, logging and discarding anything malformed
    pub fn from_stable_string(text: &str) -> Option<Self> {
        match text.parse() {
            Ok(expression) => Some(expression),
            Err(e) => {
                warn!("Invalid matcher expression '{text}': {e}");
                None
            }
        }
    }

    pub fn conditions(&self) -> &[MatchCondition] {
        match self {
            Self::All(conditions) | Self::Any(conditions) => conditions,
        }
    }

    pub fn is_anded(&self) -> bool {
        matches!(self, Self::All(_))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions().is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions().len()
    }

    pub fn matches(&self, feature: &SequenceFeature) -> bool {
        match self {
            _ if self.is_empty() => true,
            Self::All(conditions) => conditions.iter().all(|c| c.matches(feature)),
            Self::Any(conditions) => conditions.iter().any(|c| c.matches(feature)),
        }
    }

    /// Machine-readable form, e.g. `(AF LT 1.2) AND (CLIN_SIG NotContains path)`
    pub fn to_stable_string(&self) -> String {
        let joiner = if self.is_anded() { AND } else { OR };
        self.render(&format!(" {joiner} "), MatchCondition::to_stable_string)
    }

    fn render(&self, joiner: &str, each: impl Fn(&MatchCondition) -> String) -> String {
        match self.conditions() {
            [single] => each(single),
            conditions => conditions
                .iter()
                .map(|c| format!("({})", each(c)))
                .collect::<Vec<_>>()
                .join(joiner),
        }
    }
}

impl fmt::Display for MatchExpression {
    /// Human-readable form, e.g. `(AF < 1.2) or (CLIN_SIG does not contain 'path')`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joiner = if self.is_anded() { " and " } else { " or " };
        f.write_str(&self.render(joiner, |c| c.to_string()))
    }
}

impl FromStr for MatchExpression {
    type Err = MatchParseError;

    /// Parse a chain of bracketed conditions joined by AND or by OR (in any
    /// case). The brackets around the last condition may be left off. Empty
    /// text is the empty expression.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut expression = Self::new();
        let mut rest = s.trim();
        let mut first = true;

        while !rest.is_empty() {
            let mut and = true;
            if !first {
                let (conjunction, remainder) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| MatchParseError::UnknownConjunction(rest.to_string()))?;
                and = if conjunction.eq_ignore_ascii_case(AND) {
                    true
                } else if conjunction.eq_ignore_ascii_case(OR) {
                    false
                } else {
                    return Err(MatchParseError::UnknownConjunction(conjunction.to_string()));
                };
                rest = remainder.trim();
            }

            let next = if let Some(bracketed) = rest.strip_prefix('(') {
                let close = clause_end(bracketed)
                    .ok_or_else(|| MatchParseError::MissingBracket(s.to_string()))?;
                rest = bracketed[close + 1..].trim();
                &bracketed[..close]
            } else {
                std::mem::take(&mut rest)
            };

            let condition: MatchCondition = next.parse()?;
            let added = if and {
                expression.and(condition)
            } else {
                expression.or(condition)
            };
            added.map_err(|_| MatchParseError::MixedConjunctions(s.to_string()))?;
            first = false;
        }

        Ok(expression)
    }
}

impl Serialize for MatchExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_stable_string())
    }
}

impl<'de> Deserialize<'de> for MatchExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
