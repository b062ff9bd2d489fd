//! Float helpers where NaN means "no value".
//!
//! Feature scores are `f32` with NaN standing for an absent score, so the
//! usual `f32::min`/`f32::max` semantics are not quite right: those ignore a
//! NaN argument only by accident of IEEE rules, and we need the opposite
//! guarantee spelled out (a real value always wins over NaN).

/// Minimum of two values where a non-NaN value is preferred over NaN.
///
/// ```
/// use seqfeatures::utils::float::nan_min;
///
/// assert_eq!(nan_min(f32::NAN, 2.0), 2.0);
/// assert_eq!(nan_min(1.0, 2.0), 1.0);
/// assert!(nan_min(f32::NAN, f32::NAN).is_nan());
/// ```
#[must_use]
pub fn nan_min(a: f32, b: f32) -> f32 {
    match (a.is_nan(), b.is_nan()) {
        (true, _) => b,
        (false, true) => a,
        (false, false) => a.min(b),
    }
}

/// Maximum of two values where a non-NaN value is preferred over NaN.
#[must_use]
pub fn nan_max(a: f32, b: f32) -> f32 {
    match (a.is_nan(), b.is_nan()) {
        (true, _) => b,
        (false, true) => a,
        (false, false) => a.max(b),
    }
}

/// Equality where NaN equals NaN (used for feature identity).
#[must_use]
pub fn nan_eq(a: f32, b: f32) -> bool {
    if a.is_nan() {
        b.is_nan()
    } else {
        a == b
    }
}

/// Render a float the way stored filter text expects it: always with a
/// fractional part (`12.0`, `1.2`), `NaN` for an absent value.
#[must_use]
pub fn format_float(value: f32) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:?}")
    }
}

/// Serde adapter that writes a NaN score as `null` and reads `null` (or a
/// missing field, with `#[serde(default = ...)]`) back as NaN.
pub mod nan_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f32, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
    }

    #[must_use]
    pub fn absent() -> f32 {
        f32::NAN
    }
}
