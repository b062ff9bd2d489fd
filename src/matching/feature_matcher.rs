use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::core::attributes::AttributeName;
use crate::core::feature::SequenceFeature;
use crate::matching::condition::{Condition, MatchParseError, Matcher};

/// Quote character around keys and patterns; doubled inside a quoted field
pub(crate) const QUOTE: char = '\'';

/// Keyword selecting the feature description
pub const LABEL: &str = "Label";

/// Keyword selecting the feature score
pub const SCORE: &str = "Score";

/// Quote a key or pattern that would not survive re-parsing bare
fn quote_if_needed(text: &str) -> Cow<'_, str> {
    let needs_quotes = text.is_empty()
        || text.starts_with(QUOTE)
        || text.contains(|c: char| c.is_whitespace() || c == '(' || c == ')');
    if needs_quotes {
        let escaped = text.replace(QUOTE, "''");
        Cow::Owned(format!("{QUOTE}{escaped}{QUOTE}"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Read a quoted field from just after its opening quote, returning the
/// content and the text after the closing quote
fn read_quoted(text: &str) -> Option<(String, &str)> {
    let mut content = String::new();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != QUOTE {
            content.push(c);
        } else if chars.peek().is_some_and(|&(_, next)| next == QUOTE) {
            chars.next();
            content.push(QUOTE);
        } else {
            return Some((content, &text[i + c.len_utf8()..]));
        }
    }
    None
}

/// Content of a quoted pattern. A pattern written with a bare quote inside
/// (`'it's'`) is taken between its outer quotes as it is.
fn unquote(field: &str) -> Option<String> {
    let inner = field.strip_prefix(QUOTE)?;
    match read_quoted(inner) {
        Some((content, rest)) if rest.trim().is_empty() => Some(content),
        _ => inner.strip_suffix(QUOTE).map(str::to_string),
    }
}

/// Split off the first whitespace-delimited field
fn split_field(text: &str) -> (&str, Option<&str>) {
    match text.find(char::is_whitespace) {
        Some(at) => (&text[..at], Some(text[at..].trim_start())),
        None => (text, None),
    }
}

/// A single predicate over one property of a feature
#[derive(Debug, Clone, PartialEq)]
pub enum MatchCondition {
    /// Tests the feature description
    ByLabel(Matcher),
    /// Tests the feature score; an unscored feature is an absent value
    ByScore(Matcher),
    /// Tests an attribute value, looking inside a nested value for a
    /// compound name
    ByAttribute { name: AttributeName, matcher: Matcher },
}

impl MatchCondition {
    pub fn by_label(condition: Condition, pattern: &str) -> Result<Self, MatchParseError> {
        Ok(Self::ByLabel(Matcher::new(condition, pattern)?))
    }

    pub fn by_score(condition: Condition, pattern: &str) -> Result<Self, MatchParseError> {
        Ok(Self::ByScore(Matcher::new(condition, pattern)?))
    }

    pub fn by_attribute(
        condition: Condition,
        pattern: &str,
        name: AttributeName,
    ) -> Result<Self, MatchParseError> {
        Ok(Self::ByAttribute {
            name,
            matcher: Matcher::new(condition, pattern)?,
        })
    }

    /// Parse stored matcher text, logging and discarding anything malformed
    pub fn from_stable_string(text: &str) -> Option<Self> {
        match text.parse() {
            Ok(condition) => Some(condition),
            Err(e) => {
                warn!("Invalid matcher format '{text}': {e}");
                None
            }
        }
    }

    pub fn matches(&self, feature: &SequenceFeature) -> bool {
        match self {
            Self::ByLabel(matcher) => matcher.matches(Some(feature.description())),
            Self::ByScore(matcher) => matcher.matches_number(feature.score()),
            Self::ByAttribute { name, matcher } => {
                matcher.matches(feature.value_as_string(name).as_deref())
            }
        }
    }

    pub fn matcher(&self) -> &Matcher {
        match self {
            Self::ByLabel(matcher) | Self::ByScore(matcher) | Self::ByAttribute { matcher, .. } => {
                matcher
            }
        }
    }

    pub fn condition(&self) -> Condition {
        self.matcher().condition()
    }

    pub fn pattern(&self) -> String {
        self.matcher().pattern()
    }

    /// The attribute tested, `None` for label and score conditions
    pub fn attribute(&self) -> Option<&AttributeName> {
        match self {
            Self::ByAttribute { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_by_label(&self) -> bool {
        matches!(self, Self::ByLabel(_))
    }

    pub fn is_by_score(&self) -> bool {
        matches!(self, Self::ByScore(_))
    }

    pub fn is_by_attribute(&self) -> bool {
        matches!(self, Self::ByAttribute { .. })
    }

    /// Machine-readable form, parsed back by [`FromStr`], e.g.
    /// `AF LT 1.2` or `'CSQ:Poly Phen' NotMatches 'foo bar'`
    pub fn to_stable_string(&self) -> String {
        let key = match self {
            Self::ByLabel(_) => LABEL.to_string(),
            Self::ByScore(_) => SCORE.to_string(),
            Self::ByAttribute { name, .. } => quote_if_needed(&name.to_string()).into_owned(),
        };
        let condition = self.condition();
        if condition.needs_a_pattern() {
            let pattern = self.pattern();
            format!("{key} {} {}", condition.stable_name(), quote_if_needed(&pattern))
        } else {
            format!("{key} {}", condition.stable_name())
        }
    }
}

impl Default for MatchCondition {
    /// Label contains the empty string: matches every feature
    fn default() -> Self {
        Self::ByLabel(Matcher::default())
    }
}

impl fmt::Display for MatchCondition {
    /// Human-readable form, e.g. `AF < 1.2` or `Label matches 'foobar'`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByLabel(_) => f.write_str(LABEL)?,
            Self::ByScore(_) => f.write_str(SCORE)?,
            Self::ByAttribute { name, .. } => write!(f, "{name}")?,
        }
        let condition = self.condition();
        if condition.needs_a_pattern() {
            write!(f, " {}", self.matcher())
        } else {
            write!(f, " {condition}")
        }
    }
}

impl FromStr for MatchCondition {
    type Err = MatchParseError;

    /// Parse `key condition [pattern]`. The key is `Label`, `Score` (either
    /// in any case) or an attribute name; key and pattern may be quoted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(MatchParseError::Empty);
        }

        let (key, rest) = if let Some(quoted) = text.strip_prefix(QUOTE) {
            let (key, rest) = read_quoted(quoted)
                .ok_or_else(|| MatchParseError::UnbalancedQuote(text.to_string()))?;
            (Cow::Owned(key), rest.trim())
        } else {
            let (key, rest) = split_field(text);
            (Cow::Borrowed(key), rest.unwrap_or_default())
        };
        if rest.is_empty() {
            return Err(MatchParseError::MissingCondition(text.to_string()));
        }

        let (condition, pattern) = split_field(rest);
        let condition: Condition = condition.parse()?;
        let pattern = match pattern {
            None if condition.needs_a_pattern() => {
                return Err(MatchParseError::MissingPattern(condition));
            }
            None => Cow::Borrowed(""),
            Some(p) if p.starts_with(QUOTE) => Cow::Owned(
                unquote(p).ok_or_else(|| MatchParseError::UnbalancedQuote(text.to_string()))?,
            ),
            Some(p) => Cow::Borrowed(p),
        };

        if key.eq_ignore_ascii_case(LABEL) {
            Self::by_label(condition, &pattern)
        } else if key.eq_ignore_ascii_case(SCORE) {
            Self::by_score(condition, &pattern)
        } else {
            let name = AttributeName::parse(&key)
                .ok_or_else(|| MatchParseError::InvalidAttributeName(key.to_string()))?;
            Self::by_attribute(condition, &pattern, name)
        }
    }
}

impl Serialize for MatchCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_stable_string())
    }
}

impl<'de> Deserialize<'de> for MatchCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::AttributeValue;
    use std::collections::BTreeMap;

    fn af(condition: Condition, pattern: &str) -> MatchCondition {
        MatchCondition::by_attribute(condition, pattern, AttributeName::simple("AF")).unwrap()
    }

    fn variant() -> SequenceFeature {
        SequenceFeature::scored("variant", "Pathogenic variant", 3, 3, 3.2, None)
    }

    #[test]
    fn test_by_attribute_numeric() {
        let fm = af(Condition::Ge, "-2");
        let mut sf = variant();
        assert!(!fm.matches(&sf));

        sf.set_value("AF", "-3");
        assert!(!fm.matches(&sf));
        sf.set_value("AF", "-2");
        assert!(fm.matches(&sf));
        sf.set_value("AF", "foobar");
        assert!(!fm.matches(&sf));
    }

    #[test]
    fn test_by_attribute_compound() {
        let fm = MatchCondition::by_attribute(
            Condition::Contains,
            "damaging",
            AttributeName::compound("CSQ", "PolyPhen"),
        )
        .unwrap();
        let mut sf = variant();
        assert!(!fm.matches(&sf));

        let mut csq = BTreeMap::new();
        csq.insert("PolyPhen".to_string(), "possibly_damaging".to_string());
        sf.set_value("CSQ", AttributeValue::Nested(csq));
        assert!(fm.matches(&sf));

        // scalar where a nested value is expected: absent
        sf.set_value("CSQ", "possibly_damaging");
        assert!(!fm.matches(&sf));
    }

    #[test]
    fn test_by_label() {
        let sf = variant();
        assert!(MatchCondition::by_label(Condition::Contains, "PATHO").unwrap().matches(&sf));
        assert!(MatchCondition::by_label(Condition::Matches, "pathogenic variant").unwrap().matches(&sf));
        assert!(!MatchCondition::by_label(Condition::Matches, "pathogenic").unwrap().matches(&sf));
        assert!(MatchCondition::default().matches(&sf));
    }

    #[test]
    fn test_by_score() {
        let sf = variant();
        assert!(MatchCondition::by_score(Condition::Eq, "3.2").unwrap().matches(&sf));
        assert!(MatchCondition::by_score(Condition::Gt, "3").unwrap().matches(&sf));
        assert!(!MatchCondition::by_score(Condition::Lt, "3").unwrap().matches(&sf));

        let unscored = SequenceFeature::new("variant", "", 3, 3, None);
        for c in [Condition::Eq, Condition::Ne, Condition::Lt, Condition::Ge] {
            assert!(!MatchCondition::by_score(c, "0").unwrap().matches(&unscored));
        }
    }

    #[test]
    fn test_present_conditions() {
        let present = af(Condition::Present, "");
        let absent = af(Condition::NotPresent, "");
        let mut sf = variant();
        assert!(!present.matches(&sf));
        assert!(absent.matches(&sf));
        sf.set_value("AF", "0.1");
        assert!(present.matches(&sf));
        assert!(!absent.matches(&sf));
    }

    #[test]
    fn test_display() {
        assert_eq!(af(Condition::Lt, "1.2").to_string(), "AF < 1.2");
        assert_eq!(af(Condition::Present, "").to_string(), "AF is present");
        assert_eq!(af(Condition::NotPresent, "").to_string(), "AF is not present");
        assert_eq!(
            MatchCondition::by_label(Condition::Matches, "foobar").unwrap().to_string(),
            "Label matches 'foobar'"
        );
        assert_eq!(
            MatchCondition::by_score(Condition::Ge, "12.2").unwrap().to_string(),
            "Score >= 12.2"
        );
    }

    #[test]
    fn test_to_stable_string() {
        assert_eq!(af(Condition::Lt, "1.2").to_stable_string(), "AF LT 1.2");
        assert_eq!(af(Condition::Present, "").to_stable_string(), "AF Present");
        assert_eq!(af(Condition::NotPresent, "").to_stable_string(), "AF NotPresent");
        assert_eq!(
            MatchCondition::by_label(Condition::Matches, "foobar").unwrap().to_stable_string(),
            "Label Matches foobar"
        );
        assert_eq!(
            MatchCondition::by_label(Condition::Matches, "foo bar").unwrap().to_stable_string(),
            "Label Matches 'foo bar'"
        );
        assert_eq!(
            MatchCondition::by_score(Condition::Ge, "12.2").unwrap().to_stable_string(),
            "Score GE 12.2"
        );
        let fm = MatchCondition::by_attribute(
            Condition::NotMatches,
            "foo bar",
            AttributeName::compound("CSQ", "Poly Phen"),
        )
        .unwrap();
        assert_eq!(fm.to_stable_string(), "'CSQ:Poly Phen' NotMatches 'foo bar'");
        assert_eq!(MatchCondition::default().to_stable_string(), "Label Contains ''");
    }

    #[test]
    fn test_from_str() {
        let fm: MatchCondition = "'AF' LT 1.2".parse().unwrap();
        assert_eq!(fm, af(Condition::Lt, "1.2"));

        let fm: MatchCondition = "AF lt '1.2'".parse().unwrap();
        assert_eq!(fm.condition(), Condition::Lt);
        assert_eq!(fm.pattern(), "1.2");

        let fm: MatchCondition = "'AF' Present".parse().unwrap();
        assert_eq!(fm.condition(), Condition::Present);

        let fm: MatchCondition = "CSQ:Consequence contains damaging".parse().unwrap();
        assert_eq!(fm.attribute(), Some(&AttributeName::compound("CSQ", "Consequence")));

        let fm: MatchCondition = "LABEL Matches 'foobar'".parse().unwrap();
        assert!(fm.is_by_label());
        assert_eq!(fm.pattern(), "foobar");

        let fm: MatchCondition = "'Label' matches foo bar".parse().unwrap();
        assert_eq!(fm.pattern(), "foo bar");

        let fm: MatchCondition = "Score GE 12".parse().unwrap();
        assert!(fm.is_by_score());
        assert!(fm.attribute().is_none());
        assert_eq!(fm.pattern(), "12");

        let fm: MatchCondition = "'SCORE' ge '12.2'".parse().unwrap();
        assert_eq!(fm.pattern(), "12.2");
    }

    #[test]
    fn test_quotes_and_brackets_round_trip() {
        let fm = MatchCondition::by_attribute(Condition::Present, "", AttributeName::simple("it's x"))
            .unwrap();
        assert_eq!(fm.to_stable_string(), "'it''s x' Present");
        assert_eq!(fm.to_stable_string().parse::<MatchCondition>(), Ok(fm));

        let fm = MatchCondition::by_label(Condition::Contains, "f(x)").unwrap();
        assert_eq!(fm.to_stable_string(), "Label Contains 'f(x)'");
        assert_eq!(fm.to_stable_string().parse::<MatchCondition>(), Ok(fm));

        let fm = MatchCondition::by_label(Condition::Matches, "'quoted' text").unwrap();
        assert_eq!(fm.to_stable_string(), "Label Matches '''quoted'' text'");
        assert_eq!(fm.to_stable_string().parse::<MatchCondition>(), Ok(fm));

        // a quote inside a bare field needs no escaping
        let fm = MatchCondition::by_label(Condition::Contains, "5'UTR").unwrap();
        assert_eq!(fm.to_stable_string(), "Label Contains 5'UTR");
        assert_eq!(fm.to_stable_string().parse::<MatchCondition>(), Ok(fm));
    }

    #[test]
    fn test_from_str_accepts_unescaped_quote_in_pattern() {
        let fm: MatchCondition = "Label Matches 'it's here'".parse().unwrap();
        assert_eq!(fm.pattern(), "it's here");
    }

    #[test]
    fn test_from_str_rejects_malformed() {
        assert_eq!(
            "Score eq twelve".parse::<MatchCondition>(),
            Err(MatchParseError::InvalidNumber("twelve".to_string()))
        );
        assert!(matches!(
            "'Score ge 12.2".parse::<MatchCondition>(),
            Err(MatchParseError::UnbalancedQuote(_))
        ));
        assert!(matches!(
            "'Score' ge '12.2".parse::<MatchCondition>(),
            Err(MatchParseError::UnbalancedQuote(_))
        ));
        assert_eq!(
            "Score ge".parse::<MatchCondition>(),
            Err(MatchParseError::MissingPattern(Condition::Ge))
        );
        assert!(matches!(
            "Score".parse::<MatchCondition>(),
            Err(MatchParseError::MissingCondition(_))
        ));
        assert_eq!("".parse::<MatchCondition>(), Err(MatchParseError::Empty));
        assert!(matches!(
            "AF below 3".parse::<MatchCondition>(),
            Err(MatchParseError::UnknownCondition(_))
        ));
        assert!(matches!(
            "a:b:c Present".parse::<MatchCondition>(),
            Err(MatchParseError::InvalidAttributeName(_))
        ));
        assert!(MatchCondition::from_stable_string("Score").is_none());
    }

    #[test]
    fn test_stable_string_round_trip() {
        let conditions = vec![
            af(Condition::Lt, "1.2"),
            af(Condition::NotPresent, ""),
            MatchCondition::by_label(Condition::NotContains, " spaced out ").unwrap(),
            MatchCondition::by_label(Condition::Contains, "'quoted").unwrap(),
            MatchCondition::by_score(Condition::Ne, "7").unwrap(),
            MatchCondition::default(),
        ];
        for fm in conditions {
            let stable = fm.to_stable_string();
            let parsed = MatchCondition::from_stable_string(&stable).unwrap();
            assert_eq!(parsed, fm, "{stable}");
            assert_eq!(parsed.to_stable_string(), stable);
        }
    }

    #[test]
    fn test_serde_uses_stable_string() {
        let fm = af(Condition::Le, "0.5");
        let json = serde_json::to_string(&fm).unwrap();
        assert_eq!(json, "\"AF LE 0.5\"");
        let back: MatchCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fm);
        assert!(serde_json::from_str::<MatchCondition>("\"AF LE\"").is_err());
    }
}
