use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::attributes::{AttributeName, AttributeValue};
use crate::core::types::Datatype;

/// What has been seen for one attribute of one feature type
#[derive(Debug, Clone)]
struct AttributeData {
    name: AttributeName,
    descriptions: BTreeSet<String>,
    datatype: Option<Datatype>,
    range: Option<(f32, f32)>,
}

impl AttributeData {
    fn new(name: AttributeName) -> Self {
        Self {
            name,
            descriptions: BTreeSet::new(),
            datatype: None,
            range: None,
        }
    }

    fn add_description(&mut self, description: Option<&str>) {
        if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
            self.descriptions.insert(description.to_string());
        }
    }

    /// Update datatype and numeric range. Once text has been seen values
    /// are no longer parsed.
    fn add_value(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match self.datatype {
            Some(Datatype::Character | Datatype::Mixed) => {}
            Some(Datatype::Number) | None => match value.parse::<f32>() {
                Ok(number) if !number.is_nan() => {
                    self.datatype = Some(Datatype::Number);
                    self.range = Some(match self.range {
                        Some((min, max)) => (min.min(number), max.max(number)),
                        None => (number, number),
                    });
                }
                _ => {
                    self.datatype = Some(match self.datatype {
                        Some(Datatype::Number) => Datatype::Mixed,
                        _ => Datatype::Character,
                    });
                    self.range = None;
                }
            },
        }
    }
}

/// Registry of the attributes seen per feature type: their names,
/// descriptions, inferred datatype and numeric range.
///
/// Names compare case-insensitively; the first spelling seen is the one
/// reported. The registry is owned by the caller and shared by whatever
/// records into it.
#[derive(Debug, Clone, Default)]
pub struct FeatureAttributes {
    attributes: HashMap<String, BTreeMap<Vec<String>, AttributeData>>,
}

impl FeatureAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &AttributeName) -> Vec<String> {
        name.parts().map(str::to_lowercase).collect()
    }

    fn entry(&mut self, feature_type: &str, name: &AttributeName) -> &mut AttributeData {
        self.attributes
            .entry(feature_type.to_string())
            .or_default()
            .entry(Self::key(name))
            .or_insert_with(|| AttributeData::new(name.clone()))
    }

    fn data(&self, feature_type: &str, name: &AttributeName) -> Option<&AttributeData> {
        self.attributes.get(feature_type)?.get(&Self::key(name))
    }

    /// Record a value of an attribute. A nested value under a simple name is
    /// recorded as one compound attribute per inner key.
    pub fn add_attribute(
        &mut self,
        feature_type: &str,
        description: Option<&str>,
        value: &AttributeValue,
        name: &AttributeName,
    ) {
        match value {
            AttributeValue::Nested(inner) if !name.is_compound() => {
                for (key, inner_value) in inner {
                    let compound = AttributeName::compound(name.outer(), key.as_str());
                    let data = self.entry(feature_type, &compound);
                    data.add_description(description);
                    data.add_value(inner_value);
                }
            }
            _ => {
                let data = self.entry(feature_type, name);
                data.add_description(description);
                data.add_value(&value.to_string());
            }
        }
    }

    /// Record a description for an attribute without a value
    pub fn add_description(&mut self, feature_type: &str, description: &str, name: &AttributeName) {
        self.entry(feature_type, name)
            .add_description(Some(description));
    }

    /// Attribute names recorded for a feature type, sorted ignoring case
    pub fn get_attributes(&self, feature_type: &str) -> Vec<AttributeName> {
        self.attributes
            .get(feature_type)
            .map(|names| names.values().map(|d| d.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn has_attributes(&self, feature_type: &str) -> bool {
        self.attributes
            .get(feature_type)
            .is_some_and(|names| !names.is_empty())
    }

    /// The attribute's description, only while a single distinct one has
    /// been recorded
    pub fn get_description(&self, feature_type: &str, name: &AttributeName) -> Option<&str> {
        let data = self.data(feature_type, name)?;
        if data.descriptions.len() == 1 {
            data.descriptions.first().map(String::as_str)
        } else {
            None
        }
    }

    /// Numeric range seen, if every value so far has been a number
    pub fn get_min_max(&self, feature_type: &str, name: &AttributeName) -> Option<(f32, f32)> {
        self.data(feature_type, name)?.range
    }

    /// Inferred datatype, `None` until a non-blank value is recorded
    pub fn get_datatype(&self, feature_type: &str, name: &AttributeName) -> Option<Datatype> {
        self.data(feature_type, name)?.datatype
    }

    pub fn clear(&mut self) {
        self.attributes.clear();
    }

    pub fn clear_type(&mut self, feature_type: &str) {
        self.attributes.remove(feature_type);
    }
}
