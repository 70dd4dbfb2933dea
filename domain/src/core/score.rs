//! Helpers for scores that live in the unit interval.

use serde::{Deserialize, Deserializer};

/// Clamp a value into `[0, 1]`. NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Serde helper that clamps a deserialized float into `[0, 1]`.
pub fn deserialize_unit<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(clamp_unit(value))
}

/// Round to two decimals for display and derived metrics.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
