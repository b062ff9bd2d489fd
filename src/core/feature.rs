use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::attributes::FeatureAttributes;
use crate::core::attributes::{AttributeName, AttributeValue};
use crate::core::types::Strand;
use crate::utils::float::{nan_as_none, nan_eq};

/// Feature types whose begin and end are two bonded residues, not a range
pub const CONTACT_FEATURE_TYPES: [&str; 2] = ["disulfide bond", "disulphide bond"];

/// Attribute key holding the strand symbol (`+` / `-`)
pub const STRAND: &str = "STRAND";

/// Attribute key holding the codon phase; chosen not to clash with GFF keys
pub const PHASE: &str = "!Phase";

/// Attribute key holding a free-text status
pub const STATUS: &str = "status";

/// Check whether features of this type are contact (point-pair) features
#[must_use]
pub fn is_contact_type(feature_type: &str) -> bool {
    CONTACT_FEATURE_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(feature_type))
}

/// Where a feature sits on its sequence, decided once when the feature is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum FeatureLocation {
    /// A continuous range `begin..=end`, 1-based, `begin <= end`
    Positional { begin: i32, end: i32 },
    /// Two independent contact points, e.g. the residues of a disulfide bond
    Contact { first: i32, second: i32 },
    /// Annotates the sequence as a whole (stored as `0, 0`)
    NonPositional,
}

impl FeatureLocation {
    /// Classify raw coordinates for a feature of the given type.
    ///
    /// `0, 0` is non-positional whatever the type; a reversed range is
    /// normalised so that `begin <= end`.
    #[must_use]
    pub fn classify(feature_type: &str, begin: i32, end: i32) -> Self {
        if begin == 0 && end == 0 {
            Self::NonPositional
        } else if is_contact_type(feature_type) {
            Self::Contact {
                first: begin,
                second: end,
            }
        } else {
            Self::Positional {
                begin: begin.min(end),
                end: begin.max(end),
            }
        }
    }

    #[must_use]
    pub fn begin(self) -> i32 {
        match self {
            Self::Positional { begin, .. } => begin,
            Self::Contact { first, .. } => first,
            Self::NonPositional => 0,
        }
    }

    #[must_use]
    pub fn end(self) -> i32 {
        match self {
            Self::Positional { end, .. } => end,
            Self::Contact { second, .. } => second,
            Self::NonPositional => 0,
        }
    }
}

/// One sequence feature: a typed, optionally scored and grouped annotation
/// with free-form attributes.
///
/// Two features are equal when type, location, score (NaN equal to NaN),
/// group and description all match; attributes, links and source do not take
/// part. The stores rely on this to refuse duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "FeatureRecord", into = "FeatureRecord")]
pub struct SequenceFeature {
    feature_type: String,
    description: String,
    location: FeatureLocation,
    score: f32,
    group: Option<String>,
    attributes: BTreeMap<String, AttributeValue>,
    links: Vec<String>,
    source: Option<String>,
}

impl SequenceFeature {
    /// Create an unscored feature
    pub fn new(
        feature_type: impl Into<String>,
        description: impl Into<String>,
        begin: i32,
        end: i32,
        group: Option<&str>,
    ) -> Self {
        Self::scored(feature_type, description, begin, end, f32::NAN, group)
    }

    /// Create a feature with a score (`f32::NAN` for none)
    pub fn scored(
        feature_type: impl Into<String>,
        description: impl Into<String>,
        begin: i32,
        end: i32,
        score: f32,
        group: Option<&str>,
    ) -> Self {
        let feature_type = feature_type.into();
        let location = FeatureLocation::classify(&feature_type, begin, end);
        Self {
            feature_type,
            description: description.into(),
            location,
            score,
            group: group.map(str::to_string),
            attributes: BTreeMap::new(),
            links: Vec::new(),
            source: None,
        }
    }

    /// A copy of this feature at new coordinates, keeping everything else
    #[must_use]
    pub fn with_location(&self, begin: i32, end: i32) -> Self {
        let mut copy = self.clone();
        copy.location = FeatureLocation::classify(&self.feature_type, begin, end);
        copy
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: Option<&str>) -> Self {
        self.group = group.map(str::to_string);
        self
    }

    #[must_use]
    pub fn feature_type(&self) -> &str {
        &self.feature_type
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    #[must_use]
    pub fn location(&self) -> FeatureLocation {
        self.location
    }

    #[must_use]
    pub fn begin(&self) -> i32 {
        self.location.begin()
    }

    #[must_use]
    pub fn end(&self) -> i32 {
        self.location.end()
    }

    /// The score, `NaN` when the feature is unscored
    #[must_use]
    pub fn score(&self) -> f32 {
        self.score
    }

    #[must_use]
    pub fn has_score(&self) -> bool {
        !self.score.is_nan()
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub fn is_contact_feature(&self) -> bool {
        matches!(self.location, FeatureLocation::Contact { .. })
    }

    #[must_use]
    pub fn is_non_positional(&self) -> bool {
        matches!(self.location, FeatureLocation::NonPositional)
    }

    /// Ranged or contact: the feature occupies sequence positions
    #[must_use]
    pub fn is_positional(&self) -> bool {
        !self.is_non_positional()
    }

    /// Extent on the sequence: 0 when non-positional, 1 for a contact
    #[must_use]
    pub fn length(&self) -> i64 {
        match self.location {
            FeatureLocation::Positional { begin, end } => 1 + i64::from(end) - i64::from(begin),
            FeatureLocation::Contact { .. } => 1,
            FeatureLocation::NonPositional => 0,
        }
    }

    /// Check whether the feature overlaps the closed range `from..=to`.
    /// A contact feature overlaps if either contact point lies in the range.
    #[must_use]
    pub fn overlaps(&self, from: i32, to: i32) -> bool {
        match self.location {
            FeatureLocation::Positional { begin, end } => begin <= to && end >= from,
            FeatureLocation::Contact { first, second } => {
                (from..=to).contains(&first) || (from..=to).contains(&second)
            }
            FeatureLocation::NonPositional => false,
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Attribute value as text, looking inside a nested value for a
    /// compound name
    #[must_use]
    pub fn value_as_string(&self, name: &AttributeName) -> Option<Cow<'_, str>> {
        name.lookup(&self.attributes)
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Set an attribute and note it in the registry of known attributes
    pub fn set_value_recorded(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
        registry: &mut FeatureAttributes,
    ) {
        let key = key.into();
        let value = value.into();
        registry.add_attribute(
            &self.feature_type,
            None,
            &value,
            &AttributeName::simple(key.as_str()),
        );
        self.attributes.insert(key, value);
    }

    pub fn remove_value(&mut self, key: &str) -> Option<AttributeValue> {
        self.attributes.remove(key)
    }

    #[must_use]
    pub fn strand(&self) -> Strand {
        self.get_value(STRAND)
            .and_then(AttributeValue::as_scalar)
            .map_or(Strand::Unknown, Strand::parse)
    }

    pub fn set_strand(&mut self, strand: Strand) {
        self.set_value(STRAND, strand.symbol());
    }

    #[must_use]
    pub fn phase(&self) -> Option<&str> {
        self.get_value(PHASE).and_then(AttributeValue::as_scalar)
    }

    pub fn set_phase(&mut self, phase: impl Into<String>) {
        self.set_value(PHASE, phase.into());
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.get_value(STATUS).and_then(AttributeValue::as_scalar)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.set_value(STATUS, status.into());
    }

    /// Links in most-recently-added-first order
    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Add a link at the front, ignoring one already present
    pub fn add_link(&mut self, link: impl Into<String>) {
        let link = link.into();
        if !self.links.contains(&link) {
            self.links.insert(0, link);
        }
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }
}

impl PartialEq for SequenceFeature {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
            && nan_eq(self.score, other.score)
            && self.feature_type == other.feature_type
            && self.group == other.group
            && self.description == other.description
    }
}

impl Eq for SequenceFeature {}

impl fmt::Display for SequenceFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.begin(),
            self.end(),
            self.feature_type,
            self.description
        )
    }
}

/// Flat serialized form of a feature; the location shape is re-derived from
/// type and coordinates on the way back in.
#[derive(Serialize, Deserialize)]
struct FeatureRecord {
    #[serde(rename = "type")]
    feature_type: String,
    #[serde(default)]
    description: String,
    begin: i32,
    end: i32,
    #[serde(with = "nan_as_none", default = "nan_as_none::absent")]
    score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl From<FeatureRecord> for SequenceFeature {
    fn from(record: FeatureRecord) -> Self {
        let location = FeatureLocation::classify(&record.feature_type, record.begin, record.end);
        Self {
            feature_type: record.feature_type,
            description: record.description,
            location,
            score: record.score,
            group: record.group,
            attributes: record.attributes,
            links: record.links,
            source: record.source,
        }
    }
}

impl From<SequenceFeature> for FeatureRecord {
    fn from(feature: SequenceFeature) -> Self {
        Self {
            begin: feature.begin(),
            end: feature.end(),
            feature_type: feature.feature_type,
            description: feature.description,
            score: feature.score,
            group: feature.group,
            attributes: feature.attributes,
            links: feature.links,
            source: feature.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_location() {
        let f = SequenceFeature::new("Pfam", "", 10, 20, None);
        assert_eq!(f.location(), FeatureLocation::Positional { begin: 10, end: 20 });
        assert!(f.is_positional());

        let f = SequenceFeature::new("Pfam", "", 0, 0, None);
        assert!(f.is_non_positional());
        assert!(!f.is_positional());

        let f = SequenceFeature::new("Disulphide Bond", "", 23, 8, None);
        assert!(f.is_contact_feature());
        assert_eq!(f.begin(), 23);
        assert_eq!(f.end(), 8);

        // reversed range is normalised
        let f = SequenceFeature::new("Pfam", "", 20, 10, None);
        assert_eq!((f.begin(), f.end()), (10, 20));
    }

    #[test]
    fn test_equality_ignores_attributes() {
        let mut a = SequenceFeature::scored("Pfam", "desc", 4, 10, f32::NAN, Some("grp"));
        let b = SequenceFeature::scored("Pfam", "desc", 4, 10, f32::NAN, Some("grp"));
        a.set_value("AF", "0.1");
        assert_eq!(a, b);

        assert_ne!(a, b.clone().with_score(1.0));
        assert_ne!(a, b.clone().with_group(None));
        assert_ne!(a, b.with_location(4, 11));
    }

    #[test]
    fn test_length_and_overlap() {
        let ranged = SequenceFeature::new("Pfam", "", 10, 20, None);
        assert_eq!(ranged.length(), 11);
        assert!(ranged.overlaps(20, 30));
        assert!(ranged.overlaps(1, 10));
        assert!(!ranged.overlaps(21, 30));

        let contact = SequenceFeature::new("disulfide bond", "", 10, 20, None);
        assert_eq!(contact.length(), 1);
        assert!(contact.overlaps(9, 11));
        assert!(contact.overlaps(20, 20));
        assert!(!contact.overlaps(11, 19));

        let nonpos = SequenceFeature::new("Pfam", "", 0, 0, None);
        assert_eq!(nonpos.length(), 0);
        assert!(!nonpos.overlaps(0, 100));
    }

    #[test]
    fn test_with_location_keeps_details() {
        let mut f = SequenceFeature::scored("Metal", "zinc", 8, 14, 2.5, Some("grp"));
        f.set_value("AF", "0.2");
        f.add_link("http://a");
        f.set_source("Uniprot");

        let shifted = f.with_location(13, 19);
        assert_eq!((shifted.begin(), shifted.end()), (13, 19));
        assert_eq!(shifted.description(), "zinc");
        assert_eq!(shifted.score(), 2.5);
        assert_eq!(shifted.group(), Some("grp"));
        assert_eq!(shifted.get_value("AF"), Some(&AttributeValue::from("0.2")));
        assert_eq!(shifted.links(), ["http://a"]);
        assert_eq!(shifted.source(), Some("Uniprot"));
    }

    #[test]
    fn test_well_known_attributes() {
        let mut f = SequenceFeature::new("exon", "", 1, 9, None);
        assert_eq!(f.strand(), Strand::Unknown);
        f.set_strand(Strand::Reverse);
        assert_eq!(f.strand(), Strand::Reverse);
        f.set_phase("2");
        assert_eq!(f.phase(), Some("2"));
        f.set_status("confirmed");
        assert_eq!(f.status(), Some("confirmed"));

        f.add_link("a");
        f.add_link("b");
        f.add_link("a");
        assert_eq!(f.links(), ["b", "a"]);
    }

    #[test]
    fn test_set_value_recorded() {
        let mut registry = FeatureAttributes::new();
        let mut f = SequenceFeature::new("variant", "", 5, 5, None);
        f.set_value_recorded("AF", "0.25", &mut registry);
        assert_eq!(f.get_value("AF"), Some(&AttributeValue::from("0.25")));
        assert!(registry.has_attributes("variant"));
        assert_eq!(
            registry.get_min_max("variant", &AttributeName::simple("AF")),
            Some((0.25, 0.25))
        );
    }

    #[test]
    fn test_display() {
        let f = SequenceFeature::new("Pfam", "kinase", 3, 9, None);
        assert_eq!(f.to_string(), "3 9 Pfam kinase");
    }

    #[test]
    fn test_json_round_trip_keeps_nan_score() {
        let mut f = SequenceFeature::new("disulfide bond", "", 12, 40, Some("g"));
        f.set_value("note", "x");
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"score\":null"));

        let back: SequenceFeature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
        assert!(back.is_contact_feature());
        assert!(back.score().is_nan());
        assert_eq!(back.get_value("note"), Some(&AttributeValue::from("x")));
    }
}
