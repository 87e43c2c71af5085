//! Shared test fixtures for the tracker analytics integration tests.
//!
//! Provides `setup_sample_db()`, an in-memory DuckDB connection populated
//! with small record tables via NDJSON temp files, and `MockService`, a
//! scripted query/export service that records every call.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use chrono::NaiveDate;
use serde_json::json;
use tracker_analytics::{
    AnalyticsError, Connection, ExportService, FieldTemplate, FieldType, QueryParams,
    QueryService, RawResponse, RecordKind, Result, ZipFileType,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Send test logs through the `tracing` subscriber; `RUST_LOG` controls it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Sample database
// ---------------------------------------------------------------------------

/// Create an in-memory `Connection` with sample tasks, field entries,
/// counters, timers and custom field templates for early January 2024.
pub fn setup_sample_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();

    // -- tasks ----------------------------------------------------------------
    conn.register_table_from_rows(
        "tasks",
        &[
            json!({"date": "2024-01-01", "completed": true, "minutes_to_complete": 30}),
            json!({"date": "2024-01-01", "completed": false, "minutes_to_complete": null}),
            json!({"date": "2024-01-02", "completed": true, "minutes_to_complete": 60}),
            json!({"date": "2024-01-03", "completed": false, "minutes_to_complete": null}),
            json!({"date": "2024-02-10", "completed": true, "minutes_to_complete": 20}),
        ],
    )
    .unwrap();

    // -- custom field templates -----------------------------------------------
    conn.register_table_from_rows(
        "custom_field_templates",
        &[
            json!({"id": 1, "key": "mood", "field_type": "text"}),
            json!({"id": 2, "key": "weight", "field_type": "number"}),
            json!({"id": 3, "key": "spend", "field_type": "currency"}),
            json!({"id": 4, "key": "exercised", "field_type": "boolean"}),
        ],
    )
    .unwrap();

    // -- field entries (values stored as entered) -----------------------------
    conn.register_table_from_rows(
        "field_entries",
        &[
            json!({"field_key": "mood", "date": "2024-01-01", "value": "happy"}),
            json!({"field_key": "mood", "date": "2024-01-01", "value": "happy"}),
            json!({"field_key": "mood", "date": "2024-01-01", "value": "sad"}),
            json!({"field_key": "mood", "date": "2024-01-02", "value": "happy"}),
            json!({"field_key": "mood", "date": "2024-01-03", "value": "calm"}),
            json!({"field_key": "weight", "date": "2024-01-01", "value": "70.5"}),
            json!({"field_key": "weight", "date": "2024-01-02", "value": "71"}),
            json!({"field_key": "weight", "date": "2024-01-03", "value": "70"}),
            json!({"field_key": "spend", "date": "2024-01-01", "value": "12.50"}),
            json!({"field_key": "spend", "date": "2024-01-01", "value": "7.50"}),
            json!({"field_key": "spend", "date": "2024-01-03", "value": "20"}),
            json!({"field_key": "exercised", "date": "2024-01-01", "value": "true"}),
            json!({"field_key": "exercised", "date": "2024-01-02", "value": "false"}),
            json!({"field_key": "exercised", "date": "2024-01-03", "value": "yes"}),
        ],
    )
    .unwrap();

    // -- counters ---------------------------------------------------------------
    conn.register_table_from_rows(
        "counter_entries",
        &[
            json!({"name": "coffee", "date": "2024-01-01", "value": 2}),
            json!({"name": "coffee", "date": "2024-01-01", "value": 1}),
            json!({"name": "coffee", "date": "2024-01-02", "value": 3}),
            json!({"name": "water", "date": "2024-01-01", "value": 8}),
            json!({"name": "water", "date": "2024-01-03", "value": 6}),
            json!({"name": "tea", "date": "2024-03-01", "value": 1}),
        ],
    )
    .unwrap();

    // -- timers -----------------------------------------------------------------
    conn.register_table_from_rows(
        "timer_entries",
        &[
            json!({"name": "reading", "date": "2024-01-01", "duration_minutes": 30}),
            json!({"name": "reading", "date": "2024-01-02", "duration_minutes": 45}),
        ],
    )
    .unwrap();

    conn
}

// ---------------------------------------------------------------------------
// MockService
// ---------------------------------------------------------------------------

/// One recorded export request: format, record kind and the query pairs the
/// export was scoped with.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportCall {
    pub format: &'static str,
    pub kind: RecordKind,
    pub pairs: Vec<(String, String)>,
}

/// Scripted service: each query pops the next queued response.
#[derive(Default)]
pub struct MockService {
    pub responses: RefCell<VecDeque<Result<RawResponse>>>,
    pub queries: RefCell<Vec<QueryParams>>,
    pub template_calls: Cell<usize>,
    pub templates: Vec<FieldTemplate>,
    pub exports: RefCell<Vec<ExportCall>>,
    pub fail_exports: bool,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            templates: vec![
                FieldTemplate {
                    id: 1,
                    key: "weight".to_string(),
                    field_type: FieldType::Number,
                },
                FieldTemplate {
                    id: 2,
                    key: "spend".to_string(),
                    field_type: FieldType::Currency,
                },
                FieldTemplate {
                    id: 3,
                    key: "mood".to_string(),
                    field_type: FieldType::Text,
                },
            ],
            ..Default::default()
        }
    }

    /// Queue a JSON response body for the next query.
    pub fn respond(self, body: serde_json::Value) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(serde_json::from_value(body).unwrap()));
        self
    }

    /// Queue a failure for the next query.
    pub fn fail(self, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(AnalyticsError::Upstream(message.to_string())));
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.borrow().len()
    }

    fn next(&self, params: &QueryParams) -> Result<RawResponse> {
        self.queries.borrow_mut().push(params.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(AnalyticsError::Upstream("no scripted response".to_string())))
    }

    fn record_export(&self, format: &'static str, kind: RecordKind, params: &QueryParams) -> Result<Vec<u8>> {
        if self.fail_exports {
            return Err(AnalyticsError::Upstream("export backend unavailable".to_string()));
        }
        self.exports.borrow_mut().push(ExportCall {
            format,
            kind,
            pairs: params.to_query_pairs(),
        });
        Ok(format!("{}:{}", format, kind).into_bytes())
    }
}

impl QueryService for MockService {
    fn query_tasks(&self, params: &QueryParams) -> Result<RawResponse> {
        self.next(params)
    }

    fn query_fields(&self, params: &QueryParams) -> Result<RawResponse> {
        self.next(params)
    }

    fn query_counters(&self, params: &QueryParams) -> Result<RawResponse> {
        self.next(params)
    }

    fn query_timers(&self, params: &QueryParams) -> Result<RawResponse> {
        self.next(params)
    }

    fn custom_field_templates(&self) -> Result<Vec<FieldTemplate>> {
        self.template_calls.set(self.template_calls.get() + 1);
        Ok(self.templates.clone())
    }

    fn populated_counters(&self, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<String>> {
        Ok(vec!["coffee".to_string(), "water".to_string()])
    }

    fn populated_timers(&self, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<String>> {
        Ok(vec!["reading".to_string()])
    }
}

impl ExportService for MockService {
    fn export_csv(&self, kind: RecordKind, params: &QueryParams) -> Result<Vec<u8>> {
        self.record_export("csv", kind, params)
    }

    fn export_excel(&self, kind: RecordKind, params: &QueryParams) -> Result<Vec<u8>> {
        self.record_export("excel", kind, params)
    }

    fn export_zip(&self, dates: &[NaiveDate], file_type: ZipFileType) -> Result<Vec<u8>> {
        if self.fail_exports {
            return Err(AnalyticsError::Upstream("export backend unavailable".to_string()));
        }
        Ok(format!("zip:{}:{}", dates.len(), file_type.as_str()).into_bytes())
    }
}
