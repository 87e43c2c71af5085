//! Presentation rounding.
//!
//! Aggregation always runs at full precision; these helpers are applied only
//! where values leave the pipeline (normalized points and serialized summaries).

use serde::Serializer;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Two decimal places, for number and currency style values.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// One decimal place, for percentages.
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

pub(crate) fn ser_round2<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round2(*value))
}

pub(crate) fn ser_round2_opt<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.serialize_some(&round2(*v)),
        None => s.serialize_none(),
    }
}
