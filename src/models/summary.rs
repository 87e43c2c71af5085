use serde::Serialize;

use super::round::{round1, ser_round2, ser_round2_opt};

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Direction of the two most recent non-null buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Trend and percentage change, always derived together from a series.
///
/// The fields are private: the only way to obtain a `Movement` is from
/// bucket values, so `trend` can never disagree with `change_percent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Movement {
    trend: Trend,
    change_percent: Option<f64>,
}

impl Movement {
    /// Compare the last two non-null values in bucket order.
    ///
    /// `change_percent` is rounded to one decimal and `None` when fewer than
    /// two values exist or the earlier value is zero. The trend follows the
    /// sign of the rounded change; an undefined change is stable.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut recent = values.into_iter().rev().flatten();
        let latest = recent.next();
        let previous = recent.next();

        let change_percent = match (latest, previous) {
            (Some(latest), Some(previous)) if previous != 0.0 => {
                Some(round1((latest - previous) / previous.abs() * 100.0))
            }
            _ => None,
        };

        let trend = match change_percent {
            Some(c) if c > 0.0 => Trend::Increasing,
            Some(c) if c < 0.0 => Trend::Decreasing,
            _ => Trend::Stable,
        };

        Self {
            trend,
            change_percent,
        }
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn change_percent(&self) -> Option<f64> {
        self.change_percent
    }
}

// ---------------------------------------------------------------------------
// Summaries, one per (kind, field type) family
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub total: i64,
    pub completed: i64,
    pub incomplete: i64,
    pub completion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_time_to_complete_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanSummary {
    pub overall_true_count: i64,
    pub overall_false_count: i64,
    pub overall_true_percentage: f64,
    pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub total_count: i64,
    pub unique_count: i64,
    pub most_common_value: String,
    pub most_common_count: i64,
}

/// Statistics over a numeric series.
///
/// Single series report `total_count` (observations); combined series report
/// `field_count` (number of fields summed).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    #[serde(serialize_with = "ser_round2")]
    pub overall_sum: f64,
    #[serde(serialize_with = "ser_round2_opt")]
    pub overall_min: Option<f64>,
    #[serde(serialize_with = "ser_round2_opt")]
    pub overall_max: Option<f64>,
    #[serde(serialize_with = "ser_round2_opt")]
    pub overall_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_count: Option<usize>,
    #[serde(flatten)]
    pub movement: Movement,
}

impl NumericSummary {
    pub fn trend(&self) -> Trend {
        self.movement.trend()
    }

    pub fn change_percent(&self) -> Option<f64> {
        self.movement.change_percent()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Summary {
    Tasks(TaskSummary),
    Boolean(BooleanSummary),
    Categorical(CategoricalSummary),
    Numeric(NumericSummary),
}
