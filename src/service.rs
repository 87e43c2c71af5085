//! Collaborator contracts the pipeline depends on.
//!
//! Implementations live in [`crate::http`] (remote REST API),
//! [`crate::local`] (DuckDB tables) and [`crate::snapshot`] (files on disk).

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    FieldTemplate, QueryParams, RawResponse, RecordKind, RetentionSettings, ZipFileType,
};

/// Returns raw per-bucket records for validated query parameters.
///
/// A multi-key selection is answered by a single call, and every series in
/// the response lists the same buckets in the same order.
pub trait QueryService {
    fn query_tasks(&self, params: &QueryParams) -> Result<RawResponse>;

    fn query_fields(&self, params: &QueryParams) -> Result<RawResponse>;

    fn query_counters(&self, params: &QueryParams) -> Result<RawResponse>;

    fn query_timers(&self, params: &QueryParams) -> Result<RawResponse>;

    /// All registered custom fields with their declared types.
    fn custom_field_templates(&self) -> Result<Vec<FieldTemplate>>;

    /// Names of counters with at least one entry in the range.
    fn populated_counters(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>>;

    /// Names of timers with at least one entry in the range.
    fn populated_timers(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>>;

    /// Dispatch to the query matching the parameters' record kind.
    fn query(&self, params: &QueryParams) -> Result<RawResponse> {
        match params.kind() {
            RecordKind::Tasks => self.query_tasks(params),
            RecordKind::Fields => self.query_fields(params),
            RecordKind::Counters => self.query_counters(params),
            RecordKind::Timers => self.query_timers(params),
        }
    }
}

/// Turns query scopes and snapshot dates into downloadable files.
pub trait ExportService {
    fn export_csv(&self, kind: RecordKind, params: &QueryParams) -> Result<Vec<u8>>;

    fn export_excel(&self, kind: RecordKind, params: &QueryParams) -> Result<Vec<u8>>;

    fn export_zip(&self, dates: &[NaiveDate], file_type: ZipFileType) -> Result<Vec<u8>>;
}

/// Point-in-time exports of all tracked data, one per date.
pub trait SnapshotStore {
    /// Dates with a stored snapshot, oldest first.
    fn available_dates(&self) -> Result<Vec<NaiveDate>>;

    /// Capture a snapshot for today and return its date.
    fn save_snapshot(&self) -> Result<NaiveDate>;

    fn delete_snapshot(&self, date: NaiveDate) -> Result<()>;

    fn retention_settings(&self) -> Result<RetentionSettings>;

    fn update_retention_settings(&self, settings: RetentionSettings) -> Result<RetentionSettings>;
}
