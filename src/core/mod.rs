//! Core data types for sequence features.
//!
//! - [`SequenceFeature`](feature::SequenceFeature): a typed, scored, grouped
//!   annotation with a location and free-form attributes
//! - [`FeatureLocation`](feature::FeatureLocation): ranged, contact or
//!   non-positional
//! - [`AttributeName`](attributes::AttributeName),
//!   [`AttributeValue`](attributes::AttributeValue): simple or compound
//!   attribute keys and their values
//! - [`Datatype`](types::Datatype), [`Strand`](types::Strand): small shared enums
//!
//! ## Coordinates
//!
//! Positions are 1-based and inclusive. A feature at `0, 0` annotates the
//! whole sequence. Features of type `disulfide bond` (or `disulphide bond`)
//! are contact features: `begin` and `end` are two bonded residues, and only
//! those two positions count for overlap queries.

pub mod attributes;
pub mod feature;
pub mod types;
