//! Feature storage, indexing and type lookup.
//!
//! A [`SequenceFeatures`](sequence_features::SequenceFeatures) holds all the
//! features of one sequence, one [`FeatureStore`](store::FeatureStore) per
//! feature type. Ranged features in a store are indexed by a nested
//! containment list, so overlap queries only visit containers and the
//! features that actually overlap.
//!
//! ## Example
//!
//! ```rust
//! use seqfeatures::{SequenceFeature, SequenceFeatures};
//!
//! let mut features = SequenceFeatures::new();
//! features.add(SequenceFeature::new("mRNA", "", 10, 200, None));
//! features.add(SequenceFeature::new("exon", "", 10, 40, None));
//! features.add(SequenceFeature::new("disulfide bond", "", 25, 90, None));
//!
//! // overlap query across all types
//! assert_eq!(features.find_features(30, 35, &[]).len(), 2);
//!
//! // ontology-aware lookup: mRNA is a kind of transcript
//! assert_eq!(features.get_features_by_ontology(&["transcript"]).len(), 1);
//! ```
//!
//! ## Ontology
//!
//! Type names are related by a small "is-a" table compiled into the binary
//! (`ontology/sequence_ontology_lite.json`). A custom table can be loaded
//! and handed to [`SequenceFeatures::with_ontology`](sequence_features::SequenceFeatures::with_ontology):
//!
//! ```rust,no_run
//! use seqfeatures::{SequenceFeatures, SequenceOntology};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let ontology = SequenceOntology::load_from_file(Path::new("my_terms.json")).unwrap();
//! let features = SequenceFeatures::with_ontology(Arc::new(ontology));
//! ```

pub mod attributes;
pub mod nclist;
pub mod ontology;
pub mod sequence_features;
pub mod store;
