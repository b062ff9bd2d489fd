//! Feature filters: single conditions and AND/OR chains of them.
//!
//! - [`Condition`]: the comparison verb (`Contains`, `LT`, `Present`, ...)
//! - [`Matcher`]: a condition with its pattern, comparing text or numbers
//! - [`MatchCondition`]: a matcher applied to a feature's label, score or
//!   attribute (simple `AF` or compound `CSQ:Consequence`)
//! - [`MatchExpression`]: conditions joined by AND or by OR, never both
//!
//! ## Stored form
//!
//! Conditions and expressions have a stable text form that parses back to
//! an identical object. Keywords and conditions are case-insensitive;
//! any key or pattern containing whitespace is single-quoted:
//!
//! ```text
//! AF LT 1.2
//! 'CSQ:Poly Phen' NotMatches 'foo bar'
//! (AF LT 1.2) AND (CLIN_SIG NotContains path)
//! ```
//!
//! Malformed text is a [`MatchParseError`] from `parse()`, or `None` from
//! `from_stable_string`, which also logs the reason.
//!
//! ## Example
//!
//! ```rust
//! use seqfeatures::{MatchExpression, SequenceFeature};
//!
//! let filter: MatchExpression = "(AF LT 1.2) AND (CLIN_SIG NotContains path)".parse().unwrap();
//!
//! let mut variant = SequenceFeature::new("sequence_variant", "", 120, 120, None);
//! variant.set_value("AF", "0.05");
//! variant.set_value("CLIN_SIG", "benign");
//! assert!(filter.matches(&variant));
//!
//! variant.set_value("CLIN_SIG", "likely_pathogenic");
//! assert!(!filter.matches(&variant));
//! ```

pub mod condition;
pub mod expression;
pub mod feature_matcher;

pub use condition::{Condition, MatchParseError, Matcher};
pub use expression::{ExpressionError, MatchExpression};
pub use feature_matcher::MatchCondition;
