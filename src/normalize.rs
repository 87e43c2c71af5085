//! Field-type normalization.
//!
//! Turns one query result's loosely typed buckets into an ordered,
//! chart-ready series plus a summary whose shape depends on the record kind
//! and, for custom fields, the declared field type.
//!
//! Missing values follow one policy per field:
//! - measurements (numeric values, boolean answers, percentages) stay `None`;
//! - observation counts default to zero, since an absent count means nothing
//!   was observed.

use crate::combine::numeric_summary;
use crate::error::Result;
use crate::models::round::round1;
use crate::models::{
    BooleanBucket, BooleanPoint, BooleanSummary, CategoricalSummary, CountBucket, CountPoint,
    FieldType, NumericBucket, NumericPoint, RawBuckets, RawSeries, RawSummary, RecordKind,
    SeriesPoint, SeriesResult, Summary, TaskBucket, TaskPoint, TaskSummary,
};

/// Decode and normalize one raw series.
///
/// `field_type` is required for [`RecordKind::Fields`] and ignored otherwise.
/// An empty bucket list yields an empty series with no summary.
pub fn normalize(
    kind: RecordKind,
    field_type: Option<FieldType>,
    raw: &RawSeries,
) -> Result<SeriesResult> {
    let buckets = RawBuckets::decode(kind, field_type, &raw.data)?;
    Ok(normalize_buckets(&buckets, raw.summary.as_ref()))
}

/// Normalize already-decoded buckets. Pure: the same input always yields the
/// same series and summary.
pub fn normalize_buckets(buckets: &RawBuckets, service: Option<&RawSummary>) -> SeriesResult {
    if buckets.is_empty() {
        return SeriesResult::default();
    }
    match buckets {
        RawBuckets::Tasks(b) => tasks(b, service),
        RawBuckets::Boolean(b) => boolean(b),
        RawBuckets::Numeric(b) => numeric(b),
        RawBuckets::Categorical(b) => categorical(b, service),
        RawBuckets::Activity(b) => activity(b),
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn tasks(buckets: &[TaskBucket], service: Option<&RawSummary>) -> SeriesResult {
    let data = buckets
        .iter()
        .map(|b| {
            SeriesPoint::Task(TaskPoint {
                date: b.date,
                total: b.stats.total,
                completed: b.stats.completed,
                incomplete: b.stats.incomplete,
                completion_rate: round1(b.stats.completion_rate * 100.0),
            })
        })
        .collect();

    // The service aggregate is authoritative; bucket sums only fill gaps.
    let total: i64 = buckets.iter().map(|b| b.stats.total).sum();
    let completed: i64 = buckets.iter().map(|b| b.stats.completed).sum();
    let incomplete: i64 = buckets.iter().map(|b| b.stats.incomplete).sum();
    let derived_rate = if total > 0 {
        completed as f64 / total as f64
    } else {
        0.0
    };

    let empty = RawSummary::default();
    let s = service.unwrap_or(&empty);
    let summary = TaskSummary {
        total: s.total.unwrap_or(total),
        completed: s.completed.unwrap_or(completed),
        incomplete: s.incomplete.unwrap_or(incomplete),
        completion_rate: s.completion_rate.unwrap_or(derived_rate),
        avg_time_to_complete_minutes: s.avg_time_to_complete_minutes,
    };

    SeriesResult {
        data,
        summary: Some(Summary::Tasks(summary)),
    }
}

// ---------------------------------------------------------------------------
// Boolean fields
// ---------------------------------------------------------------------------

fn boolean(buckets: &[BooleanBucket]) -> SeriesResult {
    let data = buckets
        .iter()
        .map(|b| {
            SeriesPoint::Boolean(BooleanPoint {
                date: b.date,
                value: b.value.map(u8::from),
                true_count: b.true_count,
                false_count: b.false_count,
                total_count: b.total_count,
                true_percentage: b.true_percentage.map(round1),
            })
        })
        .collect();

    let mut overall_true = 0i64;
    let mut overall_false = 0i64;
    let mut total = 0i64;
    for b in buckets {
        let t = b.true_count.unwrap_or(0);
        let f = b.false_count.unwrap_or(0);
        overall_true += t;
        overall_false += f;
        total += b.total_count.unwrap_or(t + f);
    }

    let percentage = if total > 0 {
        round1(overall_true as f64 / total as f64 * 100.0)
    } else {
        0.0
    };

    SeriesResult {
        data,
        summary: Some(Summary::Boolean(BooleanSummary {
            overall_true_count: overall_true,
            overall_false_count: overall_false,
            overall_true_percentage: percentage,
            total_count: total,
        })),
    }
}

// ---------------------------------------------------------------------------
// Number and currency fields
// ---------------------------------------------------------------------------

fn numeric(buckets: &[NumericBucket]) -> SeriesResult {
    let data: Vec<SeriesPoint> = buckets
        .iter()
        .map(|b| {
            SeriesPoint::Numeric(NumericPoint {
                date: b.date,
                value: b.value,
                min: b.min,
                max: b.max,
                avg: b.avg,
                sum: b.sum,
                count: b.count,
            })
        })
        .collect();

    let values: Vec<Option<f64>> = data.iter().map(SeriesPoint::metric).collect();
    let total_count: i64 = buckets.iter().map(|b| b.count).sum();

    SeriesResult {
        data,
        summary: Some(Summary::Numeric(numeric_summary(&values, Some(total_count), None))),
    }
}

// ---------------------------------------------------------------------------
// Counted kinds: text/date/time/datetime fields, counters, timers
// ---------------------------------------------------------------------------

fn count_points(buckets: &[CountBucket]) -> Vec<SeriesPoint> {
    buckets
        .iter()
        .map(|b| {
            SeriesPoint::Count(CountPoint {
                date: b.date,
                count: b.count.unwrap_or(0),
                value: b.value,
                unique_count: b.unique_count.unwrap_or(0),
                most_common_value: b.most_common_value.clone().unwrap_or_default(),
                most_common_count: b.most_common_count.unwrap_or(0),
            })
        })
        .collect()
}

fn categorical(buckets: &[CountBucket], service: Option<&RawSummary>) -> SeriesResult {
    let data = count_points(buckets);

    let total: i64 = buckets.iter().map(|b| b.count.unwrap_or(0)).sum();
    let unique = buckets
        .iter()
        .filter_map(|b| b.unique_count)
        .max()
        .unwrap_or(0);

    // Earliest bucket wins ties.
    let mut top: Option<&CountBucket> = None;
    for b in buckets {
        let count = b.most_common_count.unwrap_or(0);
        if b.most_common_value.is_some()
            && top.map_or(true, |t| count > t.most_common_count.unwrap_or(0))
        {
            top = Some(b);
        }
    }

    let empty = RawSummary::default();
    let s = service.unwrap_or(&empty);
    let summary = CategoricalSummary {
        total_count: s.total_count.unwrap_or(total),
        unique_count: s.unique_count.unwrap_or(unique),
        most_common_value: s
            .most_common_value
            .clone()
            .or_else(|| top.and_then(|t| t.most_common_value.clone()))
            .unwrap_or_default(),
        most_common_count: s
            .most_common_count
            .or_else(|| top.and_then(|t| t.most_common_count))
            .unwrap_or(0),
    };

    SeriesResult {
        data,
        summary: Some(Summary::Categorical(summary)),
    }
}

fn activity(buckets: &[CountBucket]) -> SeriesResult {
    let data = count_points(buckets);
    let values: Vec<Option<f64>> = data.iter().map(SeriesPoint::metric).collect();
    let total_count: i64 = buckets.iter().map(|b| b.count.unwrap_or(0)).sum();

    SeriesResult {
        data,
        summary: Some(Summary::Numeric(numeric_summary(&values, Some(total_count), None))),
    }
}
