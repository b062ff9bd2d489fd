use std::collections::BTreeSet;
use tracing::debug;

use crate::catalog::nclist::NestedContainmentList;
use crate::core::feature::{FeatureLocation, SequenceFeature};
use crate::utils::float::{nan_max, nan_min};

/// Features of a single type on one sequence.
///
/// Ranged features live in a nested containment list, contact features in
/// two lists ordered by each contact point, and non-positional features in a
/// plain list. Groups, total length and score range are cached per partition;
/// "positional" always means ranged plus contact.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    nested: NestedContainmentList<SequenceFeature>,

    /// Contact features ordered by first contact point
    contact_starts: Vec<SequenceFeature>,

    /// The same contact features ordered by second contact point
    contact_ends: Vec<SequenceFeature>,

    non_positional: Vec<SequenceFeature>,

    positional_groups: BTreeSet<Option<String>>,
    non_positional_groups: BTreeSet<Option<String>>,

    total_length: i64,

    positional_min_score: f32,
    positional_max_score: f32,
    non_positional_min_score: f32,
    non_positional_max_score: f32,
}

impl FeatureStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            nested: NestedContainmentList::new(),
            contact_starts: Vec::new(),
            contact_ends: Vec::new(),
            non_positional: Vec::new(),
            positional_groups: BTreeSet::new(),
            non_positional_groups: BTreeSet::new(),
            total_length: 0,
            positional_min_score: f32::NAN,
            positional_max_score: f32::NAN,
            non_positional_min_score: f32::NAN,
            non_positional_max_score: f32::NAN,
        }
    }

    /// Add a feature, returning false if an equal one is already stored
    pub fn add(&mut self, feature: SequenceFeature) -> bool {
        if self.contains(&feature) {
            return false;
        }

        let positional = feature.is_positional();
        let group = feature.group().map(str::to_string);
        let score = feature.score();
        self.total_length += feature.length();

        match feature.location() {
            FeatureLocation::NonPositional => self.non_positional.push(feature),
            FeatureLocation::Contact { .. } => self.add_contact(feature),
            FeatureLocation::Positional { .. } => self.nested.add(feature),
        }

        if positional {
            self.positional_groups.insert(group);
            self.positional_min_score = nan_min(self.positional_min_score, score);
            self.positional_max_score = nan_max(self.positional_max_score, score);
        } else {
            self.non_positional_groups.insert(group);
            self.non_positional_min_score = nan_min(self.non_positional_min_score, score);
            self.non_positional_max_score = nan_max(self.non_positional_max_score, score);
        }
        true
    }

    fn add_contact(&mut self, feature: SequenceFeature) {
        let at = self
            .contact_starts
            .partition_point(|f| f.begin() <= feature.begin());
        self.contact_starts.insert(at, feature.clone());

        let at = self.contact_ends.partition_point(|f| f.end() <= feature.end());
        self.contact_ends.insert(at, feature);
    }

    /// Check whether an equal feature is stored
    pub fn contains(&self, feature: &SequenceFeature) -> bool {
        match feature.location() {
            FeatureLocation::NonPositional => self.non_positional.contains(feature),
            FeatureLocation::Contact { .. } => {
                let start = self
                    .contact_starts
                    .partition_point(|f| f.begin() < feature.begin());
                self.contact_starts[start..]
                    .iter()
                    .take_while(|f| f.begin() == feature.begin())
                    .any(|f| f == feature)
            }
            FeatureLocation::Positional { .. } => self.nested.contains(feature),
        }
    }

    /// Delete a stored feature equal to `feature`. Nested features beneath a
    /// deleted one stay in the store. Cached groups, length and score range
    /// are recomputed from what remains.
    pub fn delete(&mut self, feature: &SequenceFeature) -> bool {
        let removed = self.remove(feature);
        if removed {
            self.rescan();
        }
        removed
    }

    /// Take a feature out of whichever partition holds it, leaving the
    /// cached values stale
    fn remove(&mut self, feature: &SequenceFeature) -> bool {
        self.delete_contact(feature)
            || Self::delete_from(&mut self.non_positional, feature)
            || self.nested.remove(feature).is_some()
    }

    fn delete_contact(&mut self, feature: &SequenceFeature) -> bool {
        Self::delete_from(&mut self.contact_starts, feature)
            && Self::delete_from(&mut self.contact_ends, feature)
    }

    fn delete_from(list: &mut Vec<SequenceFeature>, feature: &SequenceFeature) -> bool {
        match list.iter().position(|f| f == feature) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Recompute every cached value; a deleted feature may have held an extreme
    fn rescan(&mut self) {
        self.positional_groups.clear();
        self.non_positional_groups.clear();
        self.total_length = 0;
        self.positional_min_score = f32::NAN;
        self.positional_max_score = f32::NAN;
        self.non_positional_min_score = f32::NAN;
        self.non_positional_max_score = f32::NAN;

        for feature in self.nested.iter().chain(&self.contact_starts) {
            self.positional_groups
                .insert(feature.group().map(str::to_string));
            self.total_length += feature.length();
            self.positional_min_score = nan_min(self.positional_min_score, feature.score());
            self.positional_max_score = nan_max(self.positional_max_score, feature.score());
        }

        for feature in &self.non_positional {
            self.non_positional_groups
                .insert(feature.group().map(str::to_string));
            self.non_positional_min_score =
                nan_min(self.non_positional_min_score, feature.score());
            self.non_positional_max_score =
                nan_max(self.non_positional_max_score, feature.score());
        }
    }

    /// Every positional or contact feature overlapping `from..=to`.
    /// Order is not significant.
    pub fn find_overlapping_features(&self, from: i32, to: i32) -> Vec<&SequenceFeature> {
        let mut found = self.nested.find_overlaps(from, to);
        self.find_contact_features(from, to, &mut found);
        found
    }

    fn find_contact_features<'a>(&'a self, from: i32, to: i32, found: &mut Vec<&'a SequenceFeature>) {
        let start = self.contact_starts.partition_point(|f| f.begin() < from);
        found.extend(
            self.contact_starts[start..]
                .iter()
                .take_while(|f| f.begin() <= to),
        );

        // second point in range, skipping those already found by their first point
        let start = self.contact_ends.partition_point(|f| f.end() < from);
        found.extend(
            self.contact_ends[start..]
                .iter()
                .take_while(|f| f.end() <= to)
                .filter(|f| f.begin() < from || f.begin() > to),
        );
    }

    /// Ranged and contact features
    pub fn get_positional_features(&self) -> Vec<&SequenceFeature> {
        self.nested.iter().chain(&self.contact_starts).collect()
    }

    pub fn get_contact_features(&self) -> Vec<&SequenceFeature> {
        self.contact_starts.iter().collect()
    }

    pub fn get_non_positional_features(&self) -> Vec<&SequenceFeature> {
        self.non_positional.iter().collect()
    }

    /// Every feature in the store, positional first
    pub fn get_all_features(&self) -> Vec<&SequenceFeature> {
        let mut features = self.get_positional_features();
        features.extend(&self.non_positional);
        features
    }

    pub fn get_feature_count(&self, positional: bool) -> usize {
        if positional {
            self.nested.len() + self.contact_starts.len()
        } else {
            self.non_positional.len()
        }
    }

    /// Sum of ranged feature lengths plus one per contact feature
    pub fn get_total_feature_length(&self) -> i64 {
        self.total_length
    }

    /// Distinct groups (`None` included) in the given partition
    pub fn get_feature_groups(&self, positional: bool) -> &BTreeSet<Option<String>> {
        if positional {
            &self.positional_groups
        } else {
            &self.non_positional_groups
        }
    }

    pub fn get_features_for_group(&self, positional: bool, group: Option<&str>) -> Vec<&SequenceFeature> {
        let groups = self.get_feature_groups(positional);
        if !groups.contains(&group.map(str::to_string)) {
            return Vec::new();
        }

        let features = if positional {
            self.get_positional_features()
        } else {
            self.get_non_positional_features()
        };
        features
            .into_iter()
            .filter(|f| f.group() == group)
            .collect()
    }

    /// Lowest score in the partition, NaN if nothing there is scored
    pub fn get_minimum_score(&self, positional: bool) -> f32 {
        if positional {
            self.positional_min_score
        } else {
            self.non_positional_min_score
        }
    }

    /// Highest score in the partition, NaN if nothing there is scored
    pub fn get_maximum_score(&self, positional: bool) -> f32 {
        if positional {
            self.positional_max_score
        } else {
            self.non_positional_max_score
        }
    }

    /// Shift every positional feature beginning at or after `from_position`
    /// by `shift_by`. A feature whose end would fall before position 1 is
    /// dropped; one whose begin would is clipped to 1. Non-positional features
    /// are left alone. Shifted features are replaced, not mutated.
    ///
    /// Returns true if any feature was moved or dropped.
    pub fn shift_features(&mut self, from_position: i32, shift_by: i32) -> bool {
        if shift_by == 0 {
            return false;
        }

        let affected: Vec<SequenceFeature> = self
            .get_positional_features()
            .into_iter()
            .filter(|f| f.begin() >= from_position)
            .cloned()
            .collect();
        if affected.is_empty() {
            return false;
        }

        let mut replacements = Vec::with_capacity(affected.len());
        for feature in &affected {
            self.remove(feature);
            let new_begin = feature.begin().saturating_add(shift_by);
            let new_end = feature.end().saturating_add(shift_by);
            if new_end <= 0 {
                debug!(
                    "Dropping {} feature at {}-{} shifted before sequence start",
                    feature.feature_type(),
                    feature.begin(),
                    feature.end()
                );
                continue;
            }
            replacements.push(feature.with_location(new_begin.max(1), new_end));
        }
        self.rescan();
        for feature in replacements {
            self.add(feature);
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.nested.is_empty() && self.contact_starts.is_empty() && self.non_positional.is_empty()
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(begin: i32, end: i32) -> SequenceFeature {
        SequenceFeature::new("Pfam", "", begin, end, None)
    }

    fn ranges(mut features: Vec<&SequenceFeature>) -> Vec<(i32, i32)> {
        features.sort_by_key(|f| (f.begin(), f.end()));
        features.iter().map(|f| (f.begin(), f.end())).collect()
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let mut store = FeatureStore::new();
        assert!(store.add(feature(10, 20)));
        assert!(!store.add(feature(10, 20)));
        assert_eq!(store.get_feature_count(true), 1);

        // distinct group makes a distinct feature
        assert!(store.add(feature(10, 20).with_group(Some("g"))));
        assert_eq!(store.get_feature_count(true), 2);
    }

    #[test]
    fn test_find_overlapping_features() {
        let mut store = FeatureStore::new();
        store.add(feature(10, 20));
        store.add(feature(15, 18));
        store.add(feature(30, 40));
        store.add(SequenceFeature::new("Pfam", "", 0, 0, None));

        assert_eq!(ranges(store.find_overlapping_features(12, 16)), vec![(10, 20), (15, 18)]);
        assert_eq!(ranges(store.find_overlapping_features(40, 50)), vec![(30, 40)]);
        assert!(store.find_overlapping_features(21, 29).is_empty());
    }

    #[test]
    fn test_contact_features_overlap_at_either_point() {
        let mut store = FeatureStore::new();
        let bond = SequenceFeature::new("disulfide bond", "", 10, 30, None);
        store.add(bond.clone());
        assert_eq!(store.get_contact_features(), vec![&bond]);

        assert_eq!(store.find_overlapping_features(5, 10).len(), 1);
        assert_eq!(store.find_overlapping_features(30, 35).len(), 1);
        // both points in range: reported once
        assert_eq!(store.find_overlapping_features(1, 50).len(), 1);
        // between the points: no overlap
        assert!(store.find_overlapping_features(11, 29).is_empty());

        // second point before first still works
        let reversed = SequenceFeature::new("disulfide bond", "", 40, 5, None);
        store.add(reversed);
        assert_eq!(store.find_overlapping_features(4, 6).len(), 1);
        assert_eq!(store.find_overlapping_features(38, 41).len(), 1);
        assert_eq!(store.get_total_feature_length(), 2);
    }

    #[test]
    fn test_partitions_and_counts() {
        let mut store = FeatureStore::new();
        store.add(feature(10, 20));
        store.add(SequenceFeature::new("disulfide bond", "", 3, 9, None));
        store.add(SequenceFeature::new("Pfam", "whole", 0, 0, None));

        assert_eq!(store.get_feature_count(true), 2);
        assert_eq!(store.get_feature_count(false), 1);
        assert_eq!(store.get_positional_features().len(), 2);
        assert_eq!(store.get_contact_features().len(), 1);
        assert_eq!(store.get_non_positional_features().len(), 1);
        assert_eq!(store.get_all_features().len(), 3);
        assert_eq!(store.get_total_feature_length(), 12);
    }

    #[test]
    fn test_delete_keeps_nested_children() {
        let mut store = FeatureStore::new();
        let outer = feature(1, 100);
        store.add(outer.clone());
        store.add(feature(10, 20));
        store.add(feature(12, 14));

        assert!(store.delete(&outer));
        assert!(!store.delete(&outer));
        assert_eq!(ranges(store.find_overlapping_features(13, 13)), vec![(10, 20), (12, 14)]);
        assert_eq!(store.get_total_feature_length(), 14);
    }

    #[test]
    fn test_delete_then_readd() {
        let mut store = FeatureStore::new();
        let f = feature(5, 9);
        store.add(f.clone());
        store.delete(&f);
        assert!(!store.contains(&f));
        assert!(store.is_empty());
        assert!(store.add(f.clone()));
        assert!(store.contains(&f));
        assert_eq!(store.get_feature_count(true), 1);
    }

    #[test]
    fn test_min_max_recomputed_after_delete() {
        let mut store = FeatureStore::new();
        assert!(store.get_minimum_score(true).is_nan());

        let low = SequenceFeature::scored("Metal", "", 10, 20, 1.0, None);
        let high = SequenceFeature::scored("Metal", "", 12, 16, 4.0, None);
        let mid = SequenceFeature::scored("Metal", "", 30, 32, 2.0, None);
        store.add(low.clone());
        store.add(high.clone());
        store.add(mid);
        store.add(SequenceFeature::scored("Metal", "", 0, 0, -5.0, None));

        assert_eq!(store.get_minimum_score(true), 1.0);
        assert_eq!(store.get_maximum_score(true), 4.0);
        assert_eq!(store.get_minimum_score(false), -5.0);

        store.delete(&low);
        assert_eq!(store.get_minimum_score(true), 2.0);
        store.delete(&high);
        assert_eq!(store.get_maximum_score(true), 2.0);
    }

    #[test]
    fn test_unscored_features_leave_range_nan() {
        let mut store = FeatureStore::new();
        store.add(feature(1, 5));
        assert!(store.get_minimum_score(true).is_nan());
        assert!(store.get_maximum_score(true).is_nan());
        store.add(feature(2, 5).with_score(3.5));
        assert_eq!(store.get_minimum_score(true), 3.5);
    }

    #[test]
    fn test_groups() {
        let mut store = FeatureStore::new();
        let a = feature(1, 5).with_group(Some("a"));
        store.add(a.clone());
        store.add(feature(2, 6));
        store.add(SequenceFeature::new("Pfam", "", 0, 0, Some("b")));

        let groups: Vec<_> = store.get_feature_groups(true).iter().cloned().collect();
        assert_eq!(groups, vec![None, Some("a".to_string())]);
        assert_eq!(store.get_features_for_group(true, Some("a")), vec![&a]);
        assert_eq!(store.get_features_for_group(true, None).len(), 1);
        assert!(store.get_features_for_group(true, Some("b")).is_empty());
        assert_eq!(store.get_features_for_group(false, Some("b")).len(), 1);

        store.delete(&a);
        assert!(!store.get_feature_groups(true).contains(&Some("a".to_string())));
    }

    #[test]
    fn test_shift_features() {
        let mut store = FeatureStore::new();
        store.add(feature(2, 5));
        store.add(feature(20, 30));
        store.add(SequenceFeature::new("Pfam", "", 0, 0, None));

        // only features starting at or after 10 move
        assert!(store.shift_features(10, 3));
        assert_eq!(ranges(store.get_positional_features()), vec![(2, 5), (23, 33)]);

        assert!(store.shift_features(0, 5));
        assert_eq!(ranges(store.get_positional_features()), vec![(7, 10), (28, 38)]);

        // first would end before 1 and is dropped, second is clipped
        assert!(store.shift_features(0, -30));
        assert_eq!(ranges(store.get_positional_features()), vec![(1, 8)]);
        assert_eq!(store.get_feature_count(false), 1);

        assert!(!store.shift_features(50, 2));
        assert!(!store.shift_features(0, 0));
    }

    #[test]
    fn test_shift_keeps_feature_details() {
        let mut store = FeatureStore::new();
        let mut f = SequenceFeature::scored("Metal", "zinc", 4, 6, 2.0, Some("g"));
        f.set_value("AF", "0.3");
        store.add(f);
        store.shift_features(1, 10);

        let shifted = store.get_positional_features()[0].clone();
        assert_eq!((shifted.begin(), shifted.end()), (14, 16));
        assert_eq!(shifted.description(), "zinc");
        assert_eq!(shifted.group(), Some("g"));
        assert_eq!(shifted.score(), 2.0);
        assert!(shifted.get_value("AF").is_some());
        assert_eq!(store.get_total_feature_length(), 3);
    }

    #[test]
    fn test_shift_refreshes_cached_values() {
        let mut store = FeatureStore::new();
        store.add(SequenceFeature::scored("Metal", "", 2, 4, 1.0, Some("low")));
        store.add(SequenceFeature::scored("Metal", "", 10, 19, 5.0, Some("mid")));
        store.add(SequenceFeature::scored("Metal", "", 30, 34, 9.0, None));
        assert_eq!(store.get_total_feature_length(), 18);

        // drops [2,4], clips [10,19] to [1,7], moves [30,34] to [18,22]
        assert!(store.shift_features(1, -12));
        assert_eq!(ranges(store.get_positional_features()), vec![(1, 7), (18, 22)]);
        assert_eq!(store.get_total_feature_length(), 12);
        assert_eq!(store.get_minimum_score(true), 5.0);
        assert_eq!(store.get_maximum_score(true), 9.0);
        let groups: Vec<Option<&str>> = store
            .get_feature_groups(true)
            .iter()
            .map(Option::as_deref)
            .collect();
        assert_eq!(groups, vec![None, Some("mid")]);
        assert!(store.get_features_for_group(true, Some("low")).is_empty());
    }

    #[test]
    fn test_shift_contact_feature() {
        let mut store = FeatureStore::new();
        store.add(SequenceFeature::new("disulphide bond", "", 5, 12, None));
        assert!(store.shift_features(1, 4));
        let bond = store.get_contact_features()[0];
        assert_eq!((bond.begin(), bond.end()), (9, 16));
        assert!(bond.is_contact_feature());
    }
}
