//! Multi-series combination.
//!
//! Several normalized series sharing the same buckets are summed bucket by
//! bucket, and the summary is recomputed over the summed series. The
//! per-field summaries are never merged: min, max and avg do not distribute
//! over a field-wise sum.

use crate::error::{AnalyticsError, Result};
use crate::models::{CombinedPoint, CombinedSeries, Movement, NumericSummary, SeriesPoint};

// ---------------------------------------------------------------------------
// NumericStats
// ---------------------------------------------------------------------------

/// Full-precision statistics over a sequence of optional values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericStats {
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    /// Number of non-null values.
    pub observed: usize,
}

impl NumericStats {
    pub fn from_values(values: &[Option<f64>]) -> Self {
        let mut sum = 0.0;
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut observed = 0usize;

        for v in values.iter().flatten() {
            sum += v;
            observed += 1;
            min = Some(min.map_or(*v, |m| m.min(*v)));
            max = Some(max.map_or(*v, |m| m.max(*v)));
        }

        let avg = if observed > 0 {
            Some(sum / observed as f64)
        } else {
            None
        };

        Self {
            sum,
            min,
            max,
            avg,
            observed,
        }
    }
}

/// Build a numeric summary over per-bucket values, with trend from the two
/// most recent non-null buckets.
pub(crate) fn numeric_summary(
    values: &[Option<f64>],
    total_count: Option<i64>,
    field_count: Option<usize>,
) -> NumericSummary {
    let stats = NumericStats::from_values(values);
    NumericSummary {
        overall_sum: stats.sum,
        overall_min: stats.min,
        overall_max: stats.max,
        overall_avg: stats.avg,
        total_count,
        field_count,
        movement: Movement::from_values(values.iter().copied()),
    }
}

// ---------------------------------------------------------------------------
// combine
// ---------------------------------------------------------------------------

/// Sum `series` bucket by bucket.
///
/// All series must list the same bucket dates in the same order and there
/// must be exactly one key per series. A null point contributes nothing to
/// its bucket; the bucket is null only when every series is null there.
pub fn combine(series: &[&[SeriesPoint]], field_keys: &[String]) -> Result<CombinedSeries> {
    if series.is_empty() {
        return Err(AnalyticsError::InvalidArgument(
            "at least one series is required to combine".to_string(),
        ));
    }
    if series.len() != field_keys.len() {
        return Err(AnalyticsError::InvalidArgument(format!(
            "{} series supplied for {} field keys",
            series.len(),
            field_keys.len()
        )));
    }

    let first = series[0];
    for (points, key) in series.iter().zip(field_keys).skip(1) {
        let aligned = points.len() == first.len()
            && points.iter().zip(first.iter()).all(|(a, b)| a.date() == b.date());
        if !aligned {
            return Err(AnalyticsError::InvalidArgument(format!(
                "series for '{}' does not share bucket dates with '{}'",
                key, field_keys[0]
            )));
        }
    }

    let data: Vec<CombinedPoint> = first
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            let value = series
                .iter()
                .filter_map(|points| points[i].metric())
                .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v));
            CombinedPoint {
                date: bucket.date(),
                value,
            }
        })
        .collect();

    let summary = if data.is_empty() {
        None
    } else {
        let values: Vec<Option<f64>> = data.iter().map(|p| p.value).collect();
        Some(numeric_summary(&values, None, Some(field_keys.len())))
    };

    Ok(CombinedSeries { data, summary })
}
