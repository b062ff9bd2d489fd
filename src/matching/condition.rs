use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::utils::float::format_float;

/// Every way stored matcher text can fail to parse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchParseError {
    #[error("Empty matcher text")]
    Empty,

    #[error("Unbalanced quote in '{0}'")]
    UnbalancedQuote(String),

    #[error("Missing condition in '{0}'")]
    MissingCondition(String),

    #[error("Unknown condition '{0}'")]
    UnknownCondition(String),

    #[error("Condition {0} needs a pattern")]
    MissingPattern(Condition),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("Invalid attribute name '{0}'")]
    InvalidAttributeName(String),

    #[error("Expected AND or OR but found '{0}'")]
    UnknownConjunction(String),

    #[error("Cannot mix AND and OR in '{0}'")]
    MixedConjunctions(String),

    #[error("Missing closing bracket in '{0}'")]
    MissingBracket(String),
}

/// A comparison verb. Text conditions ignore case; numeric ones compare as
/// numbers and never match a value that is not one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Contains,
    NotContains,
    Matches,
    NotMatches,
    Present,
    NotPresent,
    #[serde(rename = "EQ")]
    Eq,
    #[serde(rename = "NE")]
    Ne,
    #[serde(rename = "LT")]
    Lt,
    #[serde(rename = "LE")]
    Le,
    #[serde(rename = "GT")]
    Gt,
    #[serde(rename = "GE")]
    Ge,
}

impl Condition {
    pub const ALL: [Condition; 12] = [
        Self::Contains,
        Self::NotContains,
        Self::Matches,
        Self::NotMatches,
        Self::Present,
        Self::NotPresent,
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
    ];

    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    #[must_use]
    pub fn needs_a_pattern(self) -> bool {
        !matches!(self, Self::Present | Self::NotPresent)
    }

    /// The token used in stored matcher text
    #[must_use]
    pub fn stable_name(self) -> &'static str {
        match self {
            Self::Contains => "Contains",
            Self::NotContains => "NotContains",
            Self::Matches => "Matches",
            Self::NotMatches => "NotMatches",
            Self::Present => "Present",
            Self::NotPresent => "NotPresent",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Gt => "GT",
            Self::Ge => "GE",
        }
    }

    /// The words used when showing a matcher to a person
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "does not contain",
            Self::Matches => "matches",
            Self::NotMatches => "does not match",
            Self::Present => "is present",
            Self::NotPresent => "is not present",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Condition {
    type Err = MatchParseError;

    /// Parse a stable name, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.stable_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MatchParseError::UnknownCondition(s.to_string()))
    }
}

/// Parse a number the way stored patterns and attribute values are written:
/// surrounding whitespace and a trailing `f`/`d` type suffix are allowed
fn parse_float(s: &str) -> Option<f32> {
    let s = s.trim();
    s.parse::<f32>().ok().or_else(|| {
        s.strip_suffix(&['f', 'F', 'd', 'D'][..])
            .filter(|rest| rest.ends_with(|c: char| c.is_ascii_digit() || c == '.'))
            .and_then(|rest| rest.parse().ok())
    })
}

#[derive(Debug, Clone)]
enum Pattern {
    Text { raw: String, upper: String },
    Integer(i64),
    Float(f32),
}

/// A condition together with the pattern it compares values against.
///
/// A numeric condition's pattern is normalised when the matcher is built:
/// an integer keeps its integer form, anything else becomes a float
/// (`12.20` reads back as `12.2`, `12.0` as `12.0`). Comparisons are made
/// in single precision, the precision scores are held in.
#[derive(Debug, Clone)]
pub struct Matcher {
    condition: Condition,
    pattern: Pattern,
}

impl Matcher {
    /// Build a matcher; fails if a numeric condition gets a non-numeric pattern
    pub fn new(condition: Condition, pattern: &str) -> Result<Self, MatchParseError> {
        let pattern = if condition.is_numeric() {
            let trimmed = pattern.trim();
            if let Ok(integer) = trimmed.parse::<i64>() {
                Pattern::Integer(integer)
            } else {
                parse_float(trimmed)
                    .map(Pattern::Float)
                    .ok_or_else(|| MatchParseError::InvalidNumber(pattern.to_string()))?
            }
        } else if condition.needs_a_pattern() {
            Pattern::Text {
                raw: pattern.to_string(),
                upper: pattern.to_uppercase(),
            }
        } else {
            Pattern::Text {
                raw: String::new(),
                upper: String::new(),
            }
        };
        Ok(Self { condition, pattern })
    }

    #[must_use]
    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// The pattern in its normalised text form
    #[must_use]
    pub fn pattern(&self) -> String {
        match &self.pattern {
            Pattern::Text { raw, .. } => raw.clone(),
            Pattern::Integer(i) => i.to_string(),
            Pattern::Float(f) => format_float(*f),
        }
    }

    /// Test a value; `None` is an absent value, and so is a blank one for
    /// `Present` / `NotPresent`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return self.matches_absent();
        };
        match self.condition {
            Condition::Present => return !value.trim().is_empty(),
            Condition::NotPresent => return value.trim().is_empty(),
            _ => {}
        }
        match &self.pattern {
            Pattern::Text { upper, .. } => self.matches_text(value, upper),
            Pattern::Integer(pattern) => match value.trim().parse::<i64>() {
                Ok(v) => self.compare(v.cmp(pattern)),
                Err(_) => parse_float(value).is_some_and(|v| self.compare_float(v, *pattern as f32)),
            },
            Pattern::Float(pattern) => {
                parse_float(value).is_some_and(|v| self.compare_float(v, *pattern))
            }
        }
    }

    /// Test a number directly; NaN is an absent value
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn matches_number(&self, value: f32) -> bool {
        if value.is_nan() {
            return self.matches_absent();
        }
        match self.pattern {
            Pattern::Integer(pattern) => self.compare_float(value, pattern as f32),
            Pattern::Float(pattern) => self.compare_float(value, pattern),
            Pattern::Text { .. } => self.matches(Some(&format_float(value))),
        }
    }

    fn matches_absent(&self) -> bool {
        matches!(
            self.condition,
            Condition::NotContains | Condition::NotMatches | Condition::NotPresent
        )
    }

    fn matches_text(&self, value: &str, upper_pattern: &str) -> bool {
        let upper = value.trim().to_uppercase();
        match self.condition {
            Condition::Matches => upper == upper_pattern,
            Condition::NotMatches => upper != upper_pattern,
            Condition::Contains => upper.contains(upper_pattern),
            Condition::NotContains => !upper.contains(upper_pattern),
            _ => false,
        }
    }

    fn compare(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self.condition {
            Condition::Eq => ordering == Equal,
            Condition::Ne => ordering != Equal,
            Condition::Lt => ordering == Less,
            Condition::Le => ordering != Greater,
            Condition::Gt => ordering == Greater,
            Condition::Ge => ordering != Less,
            _ => false,
        }
    }

    #[allow(clippy::float_cmp)]
    fn compare_float(&self, value: f32, pattern: f32) -> bool {
        match self.condition {
            Condition::Eq => value == pattern,
            Condition::Ne => value != pattern,
            Condition::Lt => value < pattern,
            Condition::Le => value <= pattern,
            Condition::Gt => value > pattern,
            Condition::Ge => value >= pattern,
            _ => false,
        }
    }
}

impl Default for Matcher {
    /// Contains the empty string: any present value matches
    fn default() -> Self {
        Self {
            condition: Condition::Contains,
            pattern: Pattern::Text {
                raw: String::new(),
                upper: String::new(),
            },
        }
    }
}

impl PartialEq for Matcher {
    /// Text patterns compare ignoring case
    fn eq(&self, other: &Self) -> bool {
        self.condition == other.condition
            && match (&self.pattern, &other.pattern) {
                (Pattern::Text { upper: a, .. }, Pattern::Text { upper: b, .. }) => a == b,
                (Pattern::Integer(a), Pattern::Integer(b)) => a == b,
                (Pattern::Float(a), Pattern::Float(b)) => a.to_bits() == b.to_bits(),
                _ => false,
            }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.condition.is_numeric() {
            write!(f, "{} {}", self.condition, self.pattern())
        } else {
            write!(f, "{} '{}'", self.condition, self.pattern())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_from_str_ignores_case() {
        assert_eq!("lt".parse::<Condition>(), Ok(Condition::Lt));
        assert_eq!("NOTCONTAINS".parse::<Condition>(), Ok(Condition::NotContains));
        assert_eq!("Present".parse::<Condition>(), Ok(Condition::Present));
        assert_eq!(
            "less".parse::<Condition>(),
            Err(MatchParseError::UnknownCondition("less".to_string()))
        );
        for c in Condition::ALL {
            assert_eq!(c.stable_name().parse::<Condition>(), Ok(c));
        }
    }

    #[test]
    fn test_condition_properties() {
        assert!(Condition::Ge.is_numeric());
        assert!(!Condition::Matches.is_numeric());
        assert!(!Condition::NotPresent.needs_a_pattern());
        assert!(Condition::Eq.needs_a_pattern());
        assert_eq!(Condition::NotContains.to_string(), "does not contain");
        assert_eq!(Condition::Le.to_string(), "<=");
    }

    #[test]
    fn test_numeric_pattern_normalised() {
        assert_eq!(Matcher::new(Condition::Ge, "12").unwrap().pattern(), "12");
        assert_eq!(Matcher::new(Condition::Ge, " 12.20 ").unwrap().pattern(), "12.2");
        assert_eq!(Matcher::new(Condition::Ge, "12.0").unwrap().pattern(), "12.0");
        assert_eq!(Matcher::new(Condition::Ge, "-2F").unwrap().pattern(), "-2.0");
        assert_eq!(
            Matcher::new(Condition::Lt, "twelve"),
            Err(MatchParseError::InvalidNumber("twelve".to_string()))
        );
        // text conditions keep the pattern as given
        assert_eq!(Matcher::new(Condition::Contains, "Path ").unwrap().pattern(), "Path ");
    }

    #[test]
    fn test_text_matching() {
        let contains = Matcher::new(Condition::Contains, "path").unwrap();
        assert!(contains.matches(Some("Pathogenic")));
        assert!(!contains.matches(Some("benign")));
        assert!(!contains.matches(None));

        let not_contains = Matcher::new(Condition::NotContains, "path").unwrap();
        assert!(not_contains.matches(Some("benign")));
        assert!(not_contains.matches(None));

        let exact = Matcher::new(Condition::Matches, "benign").unwrap();
        assert!(exact.matches(Some(" BENIGN ")));
        assert!(!exact.matches(Some("likely benign")));

        let not_exact = Matcher::new(Condition::NotMatches, "benign").unwrap();
        assert!(not_exact.matches(Some("likely benign")));
        assert!(not_exact.matches(None));
    }

    #[test]
    fn test_present_and_not_present() {
        let present = Matcher::new(Condition::Present, "ignored").unwrap();
        assert_eq!(present.pattern(), "");
        assert!(present.matches(Some("x")));
        assert!(!present.matches(Some("  ")));
        assert!(!present.matches(None));

        let absent = Matcher::new(Condition::NotPresent, "").unwrap();
        assert!(absent.matches(None));
        assert!(absent.matches(Some("")));
        assert!(!absent.matches(Some("x")));
    }

    #[test]
    fn test_integer_pattern() {
        let ge = Matcher::new(Condition::Ge, "-2").unwrap();
        assert!(!ge.matches(Some("-3")));
        assert!(ge.matches(Some("-2")));
        assert!(ge.matches(Some("-1.5")));
        assert!(!ge.matches(Some("foobar")));
        assert!(!ge.matches(None));

        let ne = Matcher::new(Condition::Ne, "5").unwrap();
        assert!(ne.matches(Some("4")));
        assert!(!ne.matches(Some("5")));
        assert!(!ne.matches(None));
    }

    #[test]
    fn test_float_pattern() {
        let lt = Matcher::new(Condition::Lt, "1.2").unwrap();
        assert!(lt.matches(Some("1.1")));
        assert!(!lt.matches(Some("1.2")));
        assert!(!lt.matches(Some("abc")));

        let eq = Matcher::new(Condition::Eq, "3.2").unwrap();
        assert!(eq.matches_number(3.2));
        assert!(eq.matches(Some("3.2")));
        assert!(!eq.matches_number(f32::NAN));
    }

    #[test]
    fn test_absent_number_fails_every_numeric_condition() {
        for c in Condition::ALL.into_iter().filter(|c| c.is_numeric()) {
            let m = Matcher::new(c, "1").unwrap();
            assert!(!m.matches_number(f32::NAN), "{c:?}");
            assert!(!m.matches(None), "{c:?}");
        }
    }

    #[test]
    fn test_matcher_equality_ignores_text_case() {
        assert_eq!(
            Matcher::new(Condition::Contains, "Path").unwrap(),
            Matcher::new(Condition::Contains, "PATH").unwrap()
        );
        assert_ne!(
            Matcher::new(Condition::Contains, "Path").unwrap(),
            Matcher::new(Condition::NotContains, "Path").unwrap()
        );
        assert_ne!(
            Matcher::new(Condition::Eq, "1").unwrap(),
            Matcher::new(Condition::Eq, "1.0").unwrap()
        );
    }

    #[test]
    fn test_matcher_display() {
        assert_eq!(Matcher::new(Condition::Lt, "1.2").unwrap().to_string(), "< 1.2");
        assert_eq!(
            Matcher::new(Condition::Contains, "path").unwrap().to_string(),
            "contains 'path'"
        );
    }
}
