//! DuckDB-backed query service over locally stored records.
//!
//! Expected tables (any may be absent, which reads as "no records"):
//!
//! | table | columns |
//! |---|---|
//! | `tasks` | `date`, `completed` (bool), `minutes_to_complete` (nullable) |
//! | `field_entries` | `field_key`, `date`, `value` (text as entered) |
//! | `counter_entries` | `name`, `date`, `value` |
//! | `timer_entries` | `name`, `date`, `duration_minutes` |
//! | `custom_field_templates` | `id`, `key`, `field_type` |
//!
//! Responses have the same shape as the remote API, so they go through the
//! same normalization path.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::connection::Connection;
use crate::error::{AnalyticsError, Result};
use crate::models::{
    CompletionStatus, FieldTemplate, FieldType, Grouping, QueryParams, RawResponse, RawSeries,
    RawSummary,
};
use crate::service::QueryService;
use crate::sql_builder::SqlBuilder;

type Row = HashMap<String, Value>;

/// Where keyed entries for one record kind live.
struct EntrySource {
    table: &'static str,
    key_column: &'static str,
    value_column: &'static str,
}

const FIELD_ENTRIES: EntrySource = EntrySource {
    table: "field_entries",
    key_column: "field_key",
    value_column: "value",
};

const COUNTER_ENTRIES: EntrySource = EntrySource {
    table: "counter_entries",
    key_column: "name",
    value_column: "value",
};

const TIMER_ENTRIES: EntrySource = EntrySource {
    table: "timer_entries",
    key_column: "name",
    value_column: "duration_minutes",
};

/// Bucket shape produced for a keyed series.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Boolean,
    Numeric,
    Categorical,
    Activity,
}

impl Shape {
    fn for_field(field_type: FieldType) -> Self {
        if field_type == FieldType::Boolean {
            Shape::Boolean
        } else if field_type.is_numeric() {
            Shape::Numeric
        } else {
            Shape::Categorical
        }
    }
}

/// SQL expression truncating `column` to the start of its bucket.
///
/// Weeks start on Monday.
pub fn bucket_expr(grouping: Grouping, column: &str) -> String {
    let day = format!("CAST({} AS DATE)", column);
    match grouping {
        Grouping::None | Grouping::Day => day,
        Grouping::Week => format!("CAST(date_trunc('week', {}) AS DATE)", day),
        Grouping::Month => format!("CAST(date_trunc('month', {}) AS DATE)", day),
        Grouping::Year => format!("CAST(date_trunc('year', {}) AS DATE)", day),
    }
}

/// Answers analytics queries from DuckDB tables.
pub struct LocalQueryService {
    conn: Connection,
}

impl LocalQueryService {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn date_bounds(params: &QueryParams) -> Result<(String, String)> {
        match (params.start(), params.end()) {
            (Some(start), Some(end)) => Ok((
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string(),
            )),
            _ => Err(AnalyticsError::InvalidArgument(
                "local queries need both a start and an end date".to_string(),
            )),
        }
    }

    // -- Tasks --------------------------------------------------------------

    fn tasks(&self, params: &QueryParams) -> Result<RawResponse> {
        if !self.conn.table_exists("tasks")? {
            return Ok(RawResponse::Single(RawSeries::default()));
        }
        let (start, end) = Self::date_bounds(params)?;

        let mut filtered = SqlBuilder::new("tasks");
        filtered
            .select(&[
                format!("{} AS bucket", bucket_expr(params.group_by(), "date")),
                "completed".to_string(),
                "minutes_to_complete".to_string(),
            ])
            .where_date_range("date", &start, &end);
        match params.status() {
            CompletionStatus::All => {}
            CompletionStatus::Completed => {
                filtered.where_clause("completed", &[]);
            }
            CompletionStatus::Incomplete => {
                filtered.where_clause("NOT completed", &[]);
            }
        }

        let (sql, sql_params) = SqlBuilder::from_subquery(&filtered, "t")
            .select(&[
                "strftime(bucket, '%Y-%m-%d') AS date",
                "COUNT(*) AS total",
                "SUM(CASE WHEN completed THEN 1 ELSE 0 END) AS completed",
                "SUM(CASE WHEN completed THEN 0 ELSE 1 END) AS incomplete",
            ])
            .group_by(&["bucket"])
            .order_by(&["bucket"])
            .build();
        let rows = self.conn.execute(&sql, &sql_params)?;

        let data = rows
            .iter()
            .map(|row| {
                let total = int(row, "total");
                let completed = int(row, "completed");
                let rate = if total > 0 {
                    completed as f64 / total as f64
                } else {
                    0.0
                };
                json!({
                    "date": row.get("date").cloned().unwrap_or(Value::Null),
                    "stats": {
                        "total": total,
                        "completed": completed,
                        "incomplete": int(row, "incomplete"),
                        "completion_rate": rate,
                    }
                })
            })
            .collect();

        let (sql, sql_params) = SqlBuilder::from_subquery(&filtered, "t")
            .select(&[
                "COUNT(*) AS total",
                "SUM(CASE WHEN completed THEN 1 ELSE 0 END) AS completed",
                "SUM(CASE WHEN completed THEN 0 ELSE 1 END) AS incomplete",
                "AVG(minutes_to_complete) FILTER (WHERE completed) AS avg_minutes",
            ])
            .build();
        let totals = self.conn.execute(&sql, &sql_params)?;
        let summary = totals.first().map(|row| {
            let total = int(row, "total");
            let completed = int(row, "completed");
            RawSummary {
                total: Some(total),
                completed: Some(completed),
                incomplete: Some(int(row, "incomplete")),
                completion_rate: Some(if total > 0 {
                    completed as f64 / total as f64
                } else {
                    0.0
                }),
                avg_time_to_complete_minutes: row.get("avg_minutes").and_then(Value::as_f64),
                ..Default::default()
            }
        });

        Ok(RawResponse::Single(RawSeries { data, summary }))
    }

    // -- Keyed entries: fields, counters, timers ----------------------------

    /// Per-key entry statistics, per bucket or over the whole range.
    ///
    /// Entries are first counted per distinct value, then aggregated, so
    /// most-common and unique counts come from the same pass as the numeric
    /// statistics.
    fn entry_stats(
        &self,
        source: &EntrySource,
        params: &QueryParams,
        by_bucket: bool,
    ) -> Result<Vec<Row>> {
        let (start, end) = Self::date_bounds(params)?;

        let mut entries = SqlBuilder::new(source.table);
        entries
            .select(&[
                format!("{} AS entry_key", source.key_column),
                format!("{} AS bucket", bucket_expr(params.group_by(), "date")),
                format!("CAST({} AS VARCHAR) AS raw", source.value_column),
            ])
            .where_in(source.key_column, params.selected())
            .where_date_range("date", &start, &end);

        let mut value_counts = SqlBuilder::from_subquery(&entries, "e");
        value_counts
            .select(&[
                "entry_key",
                "bucket",
                "raw",
                "TRY_CAST(raw AS DOUBLE) AS num",
                "CASE WHEN lower(raw) IN ('true', '1', 'yes') THEN 1 \
                 WHEN lower(raw) IN ('false', '0', 'no') THEN 0 END AS flag",
                "COUNT(*) AS n",
            ])
            .group_by(&["entry_key", "bucket", "raw"]);

        let mut group = vec!["entry_key"];
        let mut select = vec!["entry_key".to_string()];
        if by_bucket {
            group.push("bucket");
            select.push("strftime(bucket, '%Y-%m-%d') AS date".to_string());
        }
        select.extend(
            [
                "SUM(n) AS count",
                "COUNT(raw) AS unique_count",
                "first(raw ORDER BY n DESC, raw) FILTER (WHERE raw IS NOT NULL) AS most_common_value",
                "MAX(n) FILTER (WHERE raw IS NOT NULL) AS most_common_count",
                "SUM(CASE WHEN num IS NOT NULL THEN n ELSE 0 END) AS num_count",
                "SUM(num * n) AS sum",
                "MIN(num) AS min",
                "MAX(num) AS max",
                "SUM(num * n) / NULLIF(SUM(CASE WHEN num IS NOT NULL THEN n ELSE 0 END), 0) AS avg",
                "SUM(CASE WHEN flag = 1 THEN n ELSE 0 END) AS true_count",
                "SUM(CASE WHEN flag = 0 THEN n ELSE 0 END) AS false_count",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        let (sql, sql_params) = SqlBuilder::from_subquery(&value_counts, "v")
            .select(&select)
            .group_by(&group)
            .order_by(&group)
            .build();
        self.conn.execute(&sql, &sql_params)
    }

    fn keyed(
        &self,
        source: &EntrySource,
        params: &QueryParams,
        shapes: &[Shape],
    ) -> Result<RawResponse> {
        let keys = params.selected();
        let (buckets, totals) = if self.conn.table_exists(source.table)? {
            (
                self.entry_stats(source, params, true)?,
                self.entry_stats(source, params, false)?,
            )
        } else {
            (Vec::new(), Vec::new())
        };
        debug!(table = source.table, keys = keys.len(), rows = buckets.len(), "local keyed query");

        let mut per_key: HashMap<String, Vec<(String, Value)>> = HashMap::new();
        let mut all_dates: BTreeSet<String> = BTreeSet::new();
        for row in &buckets {
            let key = text(row, "entry_key").unwrap_or_default();
            let Some(date) = text(row, "date") else {
                continue;
            };
            let Some(index) = keys.iter().position(|k| *k == key) else {
                continue;
            };
            all_dates.insert(date.clone());
            let bucket = shape_bucket(shapes[index], &date, row);
            per_key.entry(key).or_default().push((date, bucket));
        }

        let mut series: Vec<(String, RawSeries)> = Vec::with_capacity(keys.len());
        for key in keys {
            let mut points: HashMap<String, Value> =
                per_key.remove(key).unwrap_or_default().into_iter().collect();
            let data = if keys.len() > 1 {
                // Every key lists every bucket any selected key has.
                all_dates
                    .iter()
                    .map(|d| points.remove(d).unwrap_or_else(|| json!({"date": d, "count": 0})))
                    .collect()
            } else {
                let mut dated: Vec<(String, Value)> = points.into_iter().collect();
                dated.sort_by(|a, b| a.0.cmp(&b.0));
                dated.into_iter().map(|(_, v)| v).collect()
            };
            let summary = totals
                .iter()
                .find(|row| text(row, "entry_key").as_deref() == Some(key.as_str()))
                .map(overall_summary);
            series.push((key.clone(), RawSeries { data, summary }));
        }

        if keys.len() > 1 {
            Ok(RawResponse::Multi {
                field_keys: keys.to_vec(),
                fields: series.into_iter().collect(),
            })
        } else {
            Ok(RawResponse::Single(
                series.pop().map(|(_, s)| s).unwrap_or_default(),
            ))
        }
    }

    fn names(&self, source: &EntrySource, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        if !self.conn.table_exists(source.table)? {
            return Ok(Vec::new());
        }
        let (sql, params) = SqlBuilder::new(source.table)
            .select(&[source.key_column])
            .distinct()
            .where_date_range(
                "date",
                &start.format("%Y-%m-%d").to_string(),
                &end.format("%Y-%m-%d").to_string(),
            )
            .order_by(&[source.key_column])
            .build();
        let rows = self.conn.execute(&sql, &params)?;
        Ok(rows
            .iter()
            .filter_map(|row| text(row, source.key_column))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Row shaping
// ---------------------------------------------------------------------------

fn int(row: &Row, col: &str) -> i64 {
    row.get(col).and_then(Value::as_i64).unwrap_or(0)
}

fn text(row: &Row, col: &str) -> Option<String> {
    row.get(col).and_then(Value::as_str).map(str::to_string)
}

fn num(row: &Row, col: &str) -> Value {
    row.get(col)
        .and_then(Value::as_f64)
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn shape_bucket(shape: Shape, date: &str, row: &Row) -> Value {
    let mut bucket = Map::new();
    bucket.insert("date".to_string(), Value::from(date));
    match shape {
        Shape::Boolean => {
            let t = int(row, "true_count");
            let f = int(row, "false_count");
            let answered = t + f;
            let value = if answered == 1 { Value::Bool(t == 1) } else { Value::Null };
            let pct = if answered > 0 {
                Value::from(t as f64 / answered as f64 * 100.0)
            } else {
                Value::Null
            };
            bucket.insert("value".to_string(), value);
            bucket.insert("trueCount".to_string(), Value::from(t));
            bucket.insert("falseCount".to_string(), Value::from(f));
            bucket.insert("totalCount".to_string(), Value::from(answered));
            bucket.insert("truePercentage".to_string(), pct);
        }
        Shape::Numeric => {
            let columns = [
                ("value", "sum"),
                ("min", "min"),
                ("max", "max"),
                ("avg", "avg"),
                ("sum", "sum"),
            ];
            for (out, col) in columns {
                bucket.insert(out.to_string(), num(row, col));
            }
            bucket.insert("count".to_string(), Value::from(int(row, "num_count")));
        }
        Shape::Categorical | Shape::Activity => {
            bucket.insert("count".to_string(), Value::from(int(row, "count")));
            if shape == Shape::Activity {
                bucket.insert("value".to_string(), num(row, "sum"));
            }
            bucket.insert("uniqueCount".to_string(), Value::from(int(row, "unique_count")));
            bucket.insert(
                "mostCommonValue".to_string(),
                row.get("most_common_value").cloned().unwrap_or(Value::Null),
            );
            bucket.insert(
                "mostCommonCount".to_string(),
                Value::from(int(row, "most_common_count")),
            );
        }
    }
    Value::Object(bucket)
}

fn overall_summary(row: &Row) -> RawSummary {
    RawSummary {
        total_count: Some(int(row, "count")),
        unique_count: Some(int(row, "unique_count")),
        most_common_value: text(row, "most_common_value"),
        most_common_count: row.get("most_common_count").and_then(Value::as_i64),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// QueryService
// ---------------------------------------------------------------------------

impl QueryService for LocalQueryService {
    fn query_tasks(&self, params: &QueryParams) -> Result<RawResponse> {
        self.tasks(params)
    }

    fn query_fields(&self, params: &QueryParams) -> Result<RawResponse> {
        let templates = self.custom_field_templates()?;
        let shapes = params
            .selected()
            .iter()
            .map(|key| {
                templates
                    .iter()
                    .find(|t| &t.key == key)
                    .map(|t| Shape::for_field(t.field_type))
                    .ok_or_else(|| AnalyticsError::NotFound(format!("Unknown custom field: {}", key)))
            })
            .collect::<Result<Vec<_>>>()?;
        self.keyed(&FIELD_ENTRIES, params, &shapes)
    }

    fn query_counters(&self, params: &QueryParams) -> Result<RawResponse> {
        let shapes = vec![Shape::Activity; params.selected().len()];
        self.keyed(&COUNTER_ENTRIES, params, &shapes)
    }

    fn query_timers(&self, params: &QueryParams) -> Result<RawResponse> {
        let shapes = vec![Shape::Activity; params.selected().len()];
        self.keyed(&TIMER_ENTRIES, params, &shapes)
    }

    fn custom_field_templates(&self) -> Result<Vec<FieldTemplate>> {
        if !self.conn.table_exists("custom_field_templates")? {
            return Ok(Vec::new());
        }
        let (sql, params) = SqlBuilder::new("custom_field_templates")
            .select(&["id", "\"key\"", "field_type"])
            .order_by(&["id"])
            .build();
        self.conn.execute_into(&sql, &params)
    }

    fn populated_counters(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        self.names(&COUNTER_ENTRIES, start, end)
    }

    fn populated_timers(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        self.names(&TIMER_ENTRIES, start, end)
    }
}
