//! Field-type normalizer tests: per-kind points, summaries and the missing
//! value policy.

use serde_json::json;
use tracker_analytics::{
    normalize, FieldType, RawSeries, RawSummary, RecordKind, SeriesPoint, Summary, Trend,
};

fn raw(data: Vec<serde_json::Value>) -> RawSeries {
    RawSeries {
        data,
        summary: None,
    }
}

fn numeric_summary(result: &tracker_analytics::SeriesResult) -> &tracker_analytics::NumericSummary {
    match &result.summary {
        Some(Summary::Numeric(s)) => s,
        other => panic!("expected numeric summary, got {:?}", other),
    }
}

#[test]
fn empty_buckets_have_no_summary() {
    for (kind, ft) in [
        (RecordKind::Tasks, None),
        (RecordKind::Fields, Some(FieldType::Number)),
        (RecordKind::Counters, None),
    ] {
        let result = normalize(kind, ft, &raw(vec![])).unwrap();
        assert!(result.data.is_empty());
        assert!(result.summary.is_none());
        assert!(!result.has_data());
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[test]
fn task_points_convert_rate_to_percentage() {
    let series = RawSeries {
        data: vec![
            json!({"date": "2024-01-01", "stats": {"total": 3, "completed": 2, "incomplete": 1, "completion_rate": 0.6667}}),
            json!({"date": "2024-01-02", "stats": {"total": 0, "completed": 0, "incomplete": 0, "completion_rate": 0}}),
        ],
        summary: Some(RawSummary {
            total: Some(3),
            completed: Some(2),
            incomplete: Some(1),
            completion_rate: Some(0.6667),
            avg_time_to_complete_minutes: Some(42.5),
            ..Default::default()
        }),
    };
    let result = normalize(RecordKind::Tasks, None, &series).unwrap();
    let SeriesPoint::Task(p) = &result.data[0] else {
        panic!("expected task point");
    };
    assert_eq!(p.completion_rate, 66.7);

    let Some(Summary::Tasks(s)) = result.summary else {
        panic!("expected task summary");
    };
    assert_eq!(s.completion_rate, 0.6667);
    assert_eq!(s.avg_time_to_complete_minutes, Some(42.5));
}

#[test]
fn task_summary_falls_back_to_bucket_sums() {
    let series = raw(vec![
        json!({"date": "2024-01-01", "stats": {"total": 4, "completed": 1, "incomplete": 3, "completion_rate": 0.25}}),
        json!({"date": "2024-01-02", "stats": {"total": 4, "completed": 3, "incomplete": 1, "completion_rate": 0.75}}),
    ]);
    let result = normalize(RecordKind::Tasks, None, &series).unwrap();
    let Some(Summary::Tasks(s)) = result.summary else {
        panic!("expected task summary");
    };
    assert_eq!((s.total, s.completed, s.incomplete), (8, 4, 4));
    assert_eq!(s.completion_rate, 0.5);
    assert_eq!(s.avg_time_to_complete_minutes, None);
}

// ---------------------------------------------------------------------------
// Boolean fields
// ---------------------------------------------------------------------------

#[test]
fn boolean_values_map_to_one_zero_or_null() {
    let series = raw(vec![
        json!({"date": "2024-01-01", "value": true, "trueCount": 1, "falseCount": 0, "totalCount": 1, "truePercentage": 100}),
        json!({"date": "2024-01-02", "value": false, "trueCount": 0, "falseCount": 1, "totalCount": 1, "truePercentage": 0}),
        json!({"date": "2024-01-03", "trueCount": 2, "falseCount": 1, "totalCount": 3, "truePercentage": 66.666}),
    ]);
    let result = normalize(RecordKind::Fields, Some(FieldType::Boolean), &series).unwrap();
    let points: Vec<_> = result
        .data
        .iter()
        .map(|p| match p {
            SeriesPoint::Boolean(b) => (b.value, b.true_percentage),
            _ => panic!("expected boolean point"),
        })
        .collect();
    assert_eq!(
        points,
        vec![(Some(1), Some(100.0)), (Some(0), Some(0.0)), (None, Some(66.7))]
    );

    let Some(Summary::Boolean(s)) = result.summary else {
        panic!("expected boolean summary");
    };
    assert_eq!(s.overall_true_count, 3);
    assert_eq!(s.overall_false_count, 2);
    assert_eq!(s.total_count, 5);
    assert_eq!(s.overall_true_percentage, 60.0);
}

#[test]
fn boolean_summary_defaults_absent_counts_to_zero() {
    let series = raw(vec![json!({"date": "2024-01-01"})]);
    let result = normalize(RecordKind::Fields, Some(FieldType::Boolean), &series).unwrap();
    let Some(Summary::Boolean(s)) = &result.summary else {
        panic!("expected boolean summary");
    };
    assert_eq!(s.overall_true_count, 0);
    assert_eq!(s.overall_false_count, 0);
    assert_eq!(s.total_count, 0);
    assert_eq!(s.overall_true_percentage, 0.0);

    let SeriesPoint::Boolean(p) = &result.data[0] else {
        panic!("expected boolean point");
    };
    assert_eq!(p.value, None);
    assert_eq!(p.true_percentage, None);
}

// ---------------------------------------------------------------------------
// Number and currency fields
// ---------------------------------------------------------------------------

#[test]
fn numeric_points_round_on_output_and_preserve_nulls() {
    let series = raw(vec![
        json!({"date": "2024-01-01", "value": 10.126, "min": 1.111, "max": 9.999, "avg": 5.556, "sum": 10.126, "count": 3}),
        json!({"date": "2024-01-02", "value": null, "count": 0}),
        json!({"date": "2024-01-03", "value": "12.5", "sum": "12.5", "count": 1}),
    ]);
    let result = normalize(RecordKind::Fields, Some(FieldType::Currency), &series).unwrap();
    let SeriesPoint::Numeric(first) = &result.data[0] else {
        panic!("expected numeric point");
    };
    assert_eq!(first.value, Some(10.126));

    let out = serde_json::to_value(&result.data[0]).unwrap();
    assert_eq!(out["value"], json!(10.13));
    assert_eq!(out["min"], json!(1.11));
    assert_eq!(out["max"], json!(10.0));
    assert_eq!(out["avg"], json!(5.56));

    let SeriesPoint::Numeric(second) = &result.data[1] else {
        panic!("expected numeric point");
    };
    assert_eq!(second.value, None);
    assert_eq!(second.sum, None);
    assert_eq!(second.count, 0);
    assert!(serde_json::to_value(&result.data[1]).unwrap()["value"].is_null());

    let s = numeric_summary(&result);
    assert_eq!(s.total_count, Some(4));
    assert_eq!(s.overall_min, Some(10.126));
    assert_eq!(s.overall_max, Some(12.5));
    assert_eq!(s.trend(), Trend::Increasing);
    assert_eq!(s.field_count, None);
}

#[test]
fn numeric_summary_aggregates_before_rounding() {
    let series = raw(vec![
        json!({"date": "2024-01-01", "value": 0.004, "count": 1}),
        json!({"date": "2024-01-02", "value": 0.004, "count": 1}),
        json!({"date": "2024-01-03", "value": 0.004, "count": 1}),
    ]);
    let result = normalize(RecordKind::Fields, Some(FieldType::Number), &series).unwrap();
    let s = numeric_summary(&result);
    assert!((s.overall_sum - 0.012).abs() < 1e-12);

    let out = serde_json::to_value(s).unwrap();
    assert_eq!(out["overall_sum"], json!(0.01));
    assert_eq!(out["overall_min"], json!(0.0));
}

#[test]
fn numeric_trend_sees_changes_below_display_precision() {
    let series = raw(vec![
        json!({"date": "2024-01-01", "value": 1.004, "count": 1}),
        json!({"date": "2024-01-02", "value": 1.001, "count": 1}),
    ]);
    let result = normalize(RecordKind::Fields, Some(FieldType::Number), &series).unwrap();
    let s = numeric_summary(&result);
    assert_eq!(s.change_percent(), Some(-0.3));
    assert_eq!(s.trend(), Trend::Decreasing);
}

// ---------------------------------------------------------------------------
// Counted kinds
// ---------------------------------------------------------------------------

#[test]
fn categorical_points_default_missing_counts() {
    let series = raw(vec![
        json!({"date": "2024-01-01", "count": 2, "uniqueCount": 2, "mostCommonValue": "gym", "mostCommonCount": 1}),
        json!({"date": "2024-01-02"}),
        json!({"date": "2024-01-03", "count": 3, "uniqueCount": 1, "mostCommonValue": "run", "mostCommonCount": 3}),
    ]);
    let result = normalize(RecordKind::Fields, Some(FieldType::Text), &series).unwrap();
    let SeriesPoint::Count(empty) = &result.data[1] else {
        panic!("expected count point");
    };
    assert_eq!(empty.count, 0);
    assert_eq!(empty.unique_count, 0);
    assert_eq!(empty.most_common_value, "");
    assert_eq!(empty.most_common_count, 0);

    let Some(Summary::Categorical(s)) = &result.summary else {
        panic!("expected categorical summary");
    };
    assert_eq!(s.total_count, 5);
    assert_eq!(s.most_common_value, "run");
    assert_eq!(s.most_common_count, 3);
}

#[test]
fn categorical_summary_prefers_service_values() {
    let series = RawSeries {
        data: vec![json!({"date": "2024-01-01", "count": 2, "uniqueCount": 2, "mostCommonValue": "a", "mostCommonCount": 1})],
        summary: Some(RawSummary {
            unique_count: Some(7),
            most_common_value: Some("b".to_string()),
            most_common_count: Some(4),
            ..Default::default()
        }),
    };
    let result = normalize(RecordKind::Fields, Some(FieldType::Time), &series).unwrap();
    let Some(Summary::Categorical(s)) = result.summary else {
        panic!("expected categorical summary");
    };
    assert_eq!(s.total_count, 2);
    assert_eq!(s.unique_count, 7);
    assert_eq!(s.most_common_value, "b");
    assert_eq!(s.most_common_count, 4);
}

#[test]
fn counters_summarise_numerically() {
    let series = raw(vec![
        json!({"date": "2024-01-01", "count": 2, "value": 3}),
        json!({"date": "2024-01-02", "count": 1}),
    ]);
    let result = normalize(RecordKind::Counters, None, &series).unwrap();
    let s = numeric_summary(&result);
    assert_eq!(s.overall_sum, 4.0);
    assert_eq!(s.total_count, Some(3));
    assert_eq!(s.change_percent(), Some(-66.7));
    assert_eq!(s.trend(), Trend::Decreasing);
}

#[test]
fn normalization_is_idempotent() {
    let series = raw(vec![
        json!({"date": "2024-01-01", "value": 1.234, "count": 1}),
        json!({"date": "2024-01-02", "value": 2.345, "count": 1}),
    ]);
    let a = normalize(RecordKind::Fields, Some(FieldType::Number), &series).unwrap();
    let b = normalize(RecordKind::Fields, Some(FieldType::Number), &series).unwrap();
    assert_eq!(a, b);
}
