//! # seqfeatures
//!
//! A library for storing, querying and filtering the annotated features of a
//! biological sequence.
//!
//! A sequence carries features: typed annotations such as exons, variants or
//! domains, each spanning a range of positions, or pinned at two contact
//! points (a disulfide bond), or attached to the whole sequence. Viewers and
//! analysis tools need to ask "what overlaps columns 120-180?", "which of
//! these are transcripts?" and "which variants have AF below 1%?" quickly and
//! repeatedly.
//!
//! ## Features
//!
//! - **Per-type indexing**: one store per feature type, with overlap queries
//!   served by a nested containment list
//! - **Ontology-aware lookup**: query by a parent term (`transcript`) and get
//!   every feature whose type is-a that term (`mRNA`, ...)
//! - **Cached statistics**: feature groups, total length and score range are
//!   kept up to date as features are added and removed
//! - **Position shifting**: move every feature at or after a column
//! - **Filter expressions**: conditions on label, score or attributes, joined
//!   by AND or OR, with a round-trippable stored form
//!
//! ## Example
//!
//! ```rust
//! use seqfeatures::{MatchExpression, SequenceFeature, SequenceFeatures};
//!
//! let mut features = SequenceFeatures::new();
//!
//! let mut common = SequenceFeature::new("missense_variant", "", 40, 40, None);
//! common.set_value("AF", "0.31");
//! let mut rare = SequenceFeature::new("missense_variant", "", 55, 55, None);
//! rare.set_value("AF", "0.002");
//! features.add(common);
//! features.add(rare);
//!
//! let filter: MatchExpression = "AF LT 0.01".parse().unwrap();
//! let hits: Vec<_> = features
//!     .get_features_by_ontology(&["sequence_variant"])
//!     .into_iter()
//!     .filter(|f| filter.matches(f))
//!     .collect();
//!
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].begin(), 55);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: The feature record and its attribute values
//! - [`catalog`]: Per-sequence feature storage, indexing and ontology
//! - [`matching`]: Filter conditions and expressions
//! - [`cli`]: Command-line interface implementation
//! - [`utils`]: NaN-aware float helpers

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::attributes::FeatureAttributes;
pub use catalog::ontology::{OntologyError, SequenceOntology};
pub use catalog::sequence_features::{sort_features, SequenceFeatures};
pub use catalog::store::FeatureStore;
pub use core::attributes::{AttributeName, AttributeValue};
pub use core::feature::{FeatureLocation, SequenceFeature};
pub use core::types::*;
pub use matching::{
    Condition, ExpressionError, MatchCondition, MatchExpression, MatchParseError, Matcher,
};
