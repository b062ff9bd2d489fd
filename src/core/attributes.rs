use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Separator between the outer and inner part of a compound attribute name
pub const COMPOUND_SEPARATOR: char = ':';

/// The value of one feature attribute.
///
/// Most attributes are plain text (numbers are kept as their text form and
/// parsed on demand). A few sources, e.g. VEP `CSQ`, attach a map of
/// sub-fields; those are stored one level deep as `Nested`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Scalar(String),
    Nested(BTreeMap<String, String>),
}

impl AttributeValue {
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Nested(_) => None,
        }
    }

    #[must_use]
    pub fn as_nested(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Scalar(_) => None,
            Self::Nested(map) => Some(map),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Nested(map) => {
                let mut first = true;
                for (key, value) in map {
                    if !first {
                        write!(f, ",")?;
                    }
                    first = false;
                    write!(f, "{key}={value}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Scalar(v.to_string())
    }
}

impl From<f32> for AttributeValue {
    fn from(v: f32) -> Self {
        Self::Scalar(crate::utils::float::format_float(v))
    }
}

impl From<BTreeMap<String, String>> for AttributeValue {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::Nested(map)
    }
}

/// Name of an attribute: either simple (`AF`) or compound (`CSQ:Consequence`),
/// where the outer attribute holds a nested map and the inner part selects
/// one of its fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeName {
    outer: String,
    inner: Option<String>,
}

impl AttributeName {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            outer: name.into(),
            inner: None,
        }
    }

    pub fn compound(outer: impl Into<String>, inner: impl Into<String>) -> Self {
        Self {
            outer: outer.into(),
            inner: Some(inner.into()),
        }
    }

    /// Parse the display form (`AF` or `CSQ:Consequence`).
    ///
    /// Returns `None` for an empty name, an empty part, or more than two parts.
    #[must_use]
    pub fn parse(display: &str) -> Option<Self> {
        let mut parts = display.split(COMPOUND_SEPARATOR);
        let outer = parts.next().filter(|s| !s.is_empty())?;
        let inner = match parts.next() {
            Some("") => return None,
            Some(inner) => Some(inner.to_string()),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            outer: outer.to_string(),
            inner,
        })
    }

    #[must_use]
    pub fn outer(&self) -> &str {
        &self.outer
    }

    #[must_use]
    pub fn inner(&self) -> Option<&str> {
        self.inner.as_deref()
    }

    #[must_use]
    pub fn is_compound(&self) -> bool {
        self.inner.is_some()
    }

    /// The name parts, one or two of them
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.outer.as_str()).chain(self.inner.as_deref())
    }

    /// Look the attribute up in a feature's attribute map, descending into a
    /// nested value for a compound name. A simple name over a nested value
    /// yields the whole map in `key=value,...` form.
    #[must_use]
    pub fn lookup<'a>(
        &self,
        attributes: &'a BTreeMap<String, AttributeValue>,
    ) -> Option<Cow<'a, str>> {
        let value = attributes.get(&self.outer)?;
        match (&self.inner, value) {
            (None, AttributeValue::Scalar(s)) => Some(Cow::Borrowed(s)),
            (None, nested @ AttributeValue::Nested(_)) => Some(Cow::Owned(nested.to_string())),
            (Some(inner), AttributeValue::Nested(map)) => {
                map.get(inner).map(|s| Cow::Borrowed(s.as_str()))
            }
            (Some(_), AttributeValue::Scalar(_)) => None,
        }
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(inner) => write!(f, "{}{COMPOUND_SEPARATOR}{inner}", self.outer),
            None => write!(f, "{}", self.outer),
        }
    }
}

impl Serialize for AttributeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
