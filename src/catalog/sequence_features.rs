use std::borrow::Borrow;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::warn;

use crate::catalog::ontology::SequenceOntology;
use crate::catalog::store::FeatureStore;
use crate::core::feature::SequenceFeature;

/// All features of one sequence, held in one [`FeatureStore`] per type.
///
/// Wherever a query takes a `types` slice, an empty slice means every stored
/// type. Type names match exactly, except in the ontology-aware queries
/// ([`get_feature_types`](Self::get_feature_types),
/// [`get_features_by_ontology`](Self::get_features_by_ontology)) which also
/// accept sub-terms of the given terms.
#[derive(Debug, Clone)]
pub struct SequenceFeatures {
    stores: BTreeMap<String, FeatureStore>,
    ontology: Arc<SequenceOntology>,
}

impl SequenceFeatures {
    /// Create an empty catalog using the embedded ontology
    pub fn new() -> Self {
        Self::with_ontology(SequenceOntology::shared())
    }

    /// Create an empty catalog resolving type terms through `ontology`
    pub fn with_ontology(ontology: Arc<SequenceOntology>) -> Self {
        Self {
            stores: BTreeMap::new(),
            ontology,
        }
    }

    /// Create a catalog holding the given features (duplicates dropped)
    pub fn from_features(features: impl IntoIterator<Item = SequenceFeature>) -> Self {
        let mut catalog = Self::new();
        for feature in features {
            catalog.add(feature);
        }
        catalog
    }

    pub fn ontology(&self) -> &SequenceOntology {
        &self.ontology
    }

    /// Add a feature to the store for its type. Returns false for a
    /// duplicate, or a feature with an empty type.
    pub fn add(&mut self, feature: SequenceFeature) -> bool {
        if feature.feature_type().is_empty() {
            warn!("Feature '{feature}' has no type, not added");
            return false;
        }
        self.stores
            .entry(feature.feature_type().to_string())
            .or_default()
            .add(feature)
    }

    pub fn delete(&mut self, feature: &SequenceFeature) -> bool {
        self.stores
            .get_mut(feature.feature_type())
            .is_some_and(|store| store.delete(feature))
    }

    pub fn delete_all(&mut self) {
        self.stores.clear();
    }

    /// True if any feature of any type is stored
    pub fn has_features(&self) -> bool {
        self.stores.values().any(|store| !store.is_empty())
    }

    fn stores_for<'s: 'i, 'i>(
        &'s self,
        types: &'i [&str],
    ) -> Box<dyn Iterator<Item = &'s FeatureStore> + 'i> {
        if types.is_empty() {
            Box::new(self.stores.values())
        } else {
            Box::new(types.iter().filter_map(|t| self.stores.get(*t)))
        }
    }

    /// Positional (ranged and contact) features of the given types
    pub fn get_positional_features(&self, types: &[&str]) -> Vec<&SequenceFeature> {
        self.stores_for(types)
            .flat_map(FeatureStore::get_positional_features)
            .collect()
    }

    pub fn get_contact_features(&self, types: &[&str]) -> Vec<&SequenceFeature> {
        self.stores_for(types)
            .flat_map(FeatureStore::get_contact_features)
            .collect()
    }

    pub fn get_non_positional_features(&self, types: &[&str]) -> Vec<&SequenceFeature> {
        self.stores_for(types)
            .flat_map(FeatureStore::get_non_positional_features)
            .collect()
    }

    /// Positional then non-positional features of the given types
    pub fn get_all_features(&self, types: &[&str]) -> Vec<&SequenceFeature> {
        let mut features = self.get_positional_features(types);
        features.extend(self.get_non_positional_features(types));
        features
    }

    /// Features of the given types overlapping `from..=to`
    pub fn find_features(&self, from: i32, to: i32, types: &[&str]) -> Vec<&SequenceFeature> {
        self.stores_for(types)
            .flat_map(|store| store.find_overlapping_features(from, to))
            .collect()
    }

    /// True if `terms` is empty, or `feature_type` is one of them or a
    /// sub-term of one of them
    pub fn is_ontology_term(&self, feature_type: &str, terms: &[&str]) -> bool {
        terms.is_empty() || terms.iter().any(|term| self.ontology.is_a(feature_type, term))
    }

    /// Stored types (with at least one feature) that are, or descend from,
    /// any of `terms`; every stored type if `terms` is empty
    pub fn get_feature_types(&self, terms: &[&str]) -> BTreeSet<&str> {
        self.stores
            .iter()
            .filter(|(t, store)| !store.is_empty() && self.is_ontology_term(t, terms))
            .map(|(t, _)| t.as_str())
            .collect()
    }

    /// All features whose type is, or descends from, any of `terms`.
    /// Ancestors of a term are never included.
    pub fn get_features_by_ontology(&self, terms: &[&str]) -> Vec<&SequenceFeature> {
        let types: Vec<&str> = self.get_feature_types(terms).into_iter().collect();
        if types.is_empty() {
            return Vec::new();
        }
        self.get_all_features(&types)
    }

    pub fn get_feature_count(&self, positional: bool, types: &[&str]) -> usize {
        self.stores_for(types)
            .map(|store| store.get_feature_count(positional))
            .sum()
    }

    pub fn get_total_feature_length(&self, types: &[&str]) -> i64 {
        self.stores_for(types)
            .map(FeatureStore::get_total_feature_length)
            .sum()
    }

    /// Distinct groups (`None` included) across the given types
    pub fn get_feature_groups(&self, positional: bool, types: &[&str]) -> BTreeSet<Option<&str>> {
        self.stores_for(types)
            .flat_map(|store| store.get_feature_groups(positional))
            .map(Option::as_deref)
            .collect()
    }

    /// Types having at least one feature in any of `groups`
    pub fn get_feature_types_for_groups(&self, positional: bool, groups: &[Option<&str>]) -> BTreeSet<&str> {
        self.stores
            .iter()
            .filter(|(_, store)| {
                let present = store.get_feature_groups(positional);
                groups
                    .iter()
                    .any(|g| present.contains(&g.map(str::to_string)))
            })
            .map(|(t, _)| t.as_str())
            .collect()
    }

    pub fn get_features_for_group(
        &self,
        positional: bool,
        group: Option<&str>,
        types: &[&str],
    ) -> Vec<&SequenceFeature> {
        self.stores_for(types)
            .flat_map(|store| store.get_features_for_group(positional, group))
            .collect()
    }

    /// Lowest score of a type, NaN if it has no scored features
    pub fn get_minimum_score(&self, feature_type: &str, positional: bool) -> f32 {
        self.stores
            .get(feature_type)
            .map_or(f32::NAN, |store| store.get_minimum_score(positional))
    }

    /// Highest score of a type, NaN if it has no scored features
    pub fn get_maximum_score(&self, feature_type: &str, positional: bool) -> f32 {
        self.stores
            .get(feature_type)
            .map_or(f32::NAN, |store| store.get_maximum_score(positional))
    }

    /// Shift positional features of every type; true if any changed
    pub fn shift_features(&mut self, from_position: i32, shift_by: i32) -> bool {
        let mut modified = false;
        for store in self.stores.values_mut() {
            modified |= store.shift_features(from_position, shift_by);
        }
        modified
    }
}

impl Default for SequenceFeatures {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort features into nesting order.
///
/// Ascending sorts by begin, wider first on a tie; descending sorts by end
/// (last first), wider first on a tie. The sort is stable.
pub fn sort_features<T: Borrow<SequenceFeature>>(features: &mut [T], ascending: bool) {
    if ascending {
        features.sort_by_key(|f| {
            let f = f.borrow();
            (f.begin(), Reverse(f.end()))
        });
    } else {
        features.sort_by_key(|f| {
            let f = f.borrow();
            (Reverse(f.end()), f.begin())
        });
    }
}
