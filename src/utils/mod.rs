//! Small numeric helpers shared by the feature store and the matchers.

pub mod float;
