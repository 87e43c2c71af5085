use chrono::NaiveDate;
use serde::Serialize;

use super::round::ser_round2_opt;

// ---------------------------------------------------------------------------
// Normalized, chart-ready points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPoint {
    pub date: NaiveDate,
    pub total: i64,
    pub completed: i64,
    pub incomplete: i64,
    /// Percentage, one decimal.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanPoint {
    pub date: NaiveDate,
    /// 1 for true, 0 for false, `None` when the bucket has no single answer.
    pub value: Option<u8>,
    pub true_count: Option<i64>,
    pub false_count: Option<i64>,
    pub total_count: Option<i64>,
    pub true_percentage: Option<f64>,
}

/// Values are kept at full precision and rounded to two places on output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericPoint {
    pub date: NaiveDate,
    #[serde(serialize_with = "ser_round2_opt")]
    pub value: Option<f64>,
    #[serde(serialize_with = "ser_round2_opt")]
    pub min: Option<f64>,
    #[serde(serialize_with = "ser_round2_opt")]
    pub max: Option<f64>,
    #[serde(serialize_with = "ser_round2_opt")]
    pub avg: Option<f64>,
    #[serde(serialize_with = "ser_round2_opt")]
    pub sum: Option<f64>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountPoint {
    pub date: NaiveDate,
    pub count: i64,
    /// Summed amount for counters and timers; `None` when not reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub unique_count: i64,
    pub most_common_value: String,
    pub most_common_count: i64,
}

/// One entry of a normalized series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesPoint {
    Task(TaskPoint),
    Boolean(BooleanPoint),
    Numeric(NumericPoint),
    Count(CountPoint),
}

impl SeriesPoint {
    pub fn date(&self) -> NaiveDate {
        match self {
            SeriesPoint::Task(p) => p.date,
            SeriesPoint::Boolean(p) => p.date,
            SeriesPoint::Numeric(p) => p.date,
            SeriesPoint::Count(p) => p.date,
        }
    }

    /// The single number this bucket contributes to trends and combined sums.
    ///
    /// Number/currency use the bucket value (falling back to its sum),
    /// booleans the true count, counted kinds their amount (falling back to
    /// the entry count), tasks the completed count.
    pub fn metric(&self) -> Option<f64> {
        match self {
            SeriesPoint::Task(p) => Some(p.completed as f64),
            SeriesPoint::Boolean(p) => p.true_count.map(|c| c as f64),
            SeriesPoint::Numeric(p) => p.value.or(p.sum),
            SeriesPoint::Count(p) => p.value.or(Some(p.count as f64)),
        }
    }
}

/// One bucket of a combined multi-field series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedPoint {
    pub date: NaiveDate,
    /// Sum across fields; `None` only when every field is null at this bucket.
    #[serde(serialize_with = "ser_round2_opt")]
    pub value: Option<f64>,
}
