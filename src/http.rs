//! REST client implementing every collaborator contract against the tracker
//! API.
//!
//! Query endpoint failures surface as [`AnalyticsError::Upstream`]; export
//! and snapshot endpoint failures as [`AnalyticsError::Export`].

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config;
use crate::error::{AnalyticsError, Result};
use crate::models::{
    FieldTemplate, PopulatedCounters, PopulatedTimers, QueryParams, RawResponse, RecordKind,
    RetentionSettings, SnapshotDates, ZipFileType,
};
use crate::service::{ExportService, QueryService, SnapshotStore};

#[derive(Debug, Deserialize)]
struct SavedSnapshot {
    date: NaiveDate,
}

/// Blocking HTTP client for the tracker API.
pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send()?.error_for_status()?;
        Ok(resp.json()?)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<T> {
        debug!(path, params = query.len(), "GET");
        self.send_json(self.client.get(self.url(path)).query(query))
    }

    fn get_bytes(&self, path: &str, query: &[(String, String)]) -> Result<Vec<u8>> {
        debug!(path, params = query.len(), "GET (download)");
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()?
            .error_for_status()?;
        Ok(resp.bytes()?.to_vec())
    }

    fn analytics(&self, kind: RecordKind, params: &QueryParams) -> Result<RawResponse> {
        self.get_json(&config::analytics_path(kind.as_str()), &params.to_query_pairs())
            .map_err(as_upstream)
    }

    fn export(&self, format: &str, kind: RecordKind, params: &QueryParams) -> Result<Vec<u8>> {
        self.get_bytes(
            &config::export_path(format, kind.as_str()),
            &params.to_query_pairs(),
        )
        .map_err(as_export)
    }
}

fn range_pairs(start: NaiveDate, end: NaiveDate) -> Vec<(String, String)> {
    vec![
        ("start_date".to_string(), start.format("%Y-%m-%d").to_string()),
        ("end_date".to_string(), end.format("%Y-%m-%d").to_string()),
    ]
}

fn as_upstream(e: AnalyticsError) -> AnalyticsError {
    AnalyticsError::Upstream(e.to_string())
}

fn as_export(e: AnalyticsError) -> AnalyticsError {
    AnalyticsError::Export(e.to_string())
}

// ---------------------------------------------------------------------------
// QueryService
// ---------------------------------------------------------------------------

impl QueryService for HttpService {
    fn query_tasks(&self, params: &QueryParams) -> Result<RawResponse> {
        self.analytics(RecordKind::Tasks, params)
    }

    fn query_fields(&self, params: &QueryParams) -> Result<RawResponse> {
        self.analytics(RecordKind::Fields, params)
    }

    fn query_counters(&self, params: &QueryParams) -> Result<RawResponse> {
        self.analytics(RecordKind::Counters, params)
    }

    fn query_timers(&self, params: &QueryParams) -> Result<RawResponse> {
        self.analytics(RecordKind::Timers, params)
    }

    fn custom_field_templates(&self) -> Result<Vec<FieldTemplate>> {
        self.get_json(config::TEMPLATES_PATH, &[]).map_err(as_upstream)
    }

    fn populated_counters(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        let resp: PopulatedCounters = self
            .get_json(config::POPULATED_COUNTERS_PATH, &range_pairs(start, end))
            .map_err(as_upstream)?;
        Ok(resp.counters.into_iter().map(|c| c.name).collect())
    }

    fn populated_timers(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        let resp: PopulatedTimers = self
            .get_json(config::POPULATED_TIMERS_PATH, &range_pairs(start, end))
            .map_err(as_upstream)?;
        Ok(resp.timers.into_iter().map(|t| t.name).collect())
    }
}

// ---------------------------------------------------------------------------
// ExportService
// ---------------------------------------------------------------------------

impl ExportService for HttpService {
    fn export_csv(&self, kind: RecordKind, params: &QueryParams) -> Result<Vec<u8>> {
        self.export("csv", kind, params)
    }

    fn export_excel(&self, kind: RecordKind, params: &QueryParams) -> Result<Vec<u8>> {
        self.export("excel", kind, params)
    }

    fn export_zip(&self, dates: &[NaiveDate], file_type: ZipFileType) -> Result<Vec<u8>> {
        let mut query: Vec<(String, String)> = dates
            .iter()
            .map(|d| ("dates".to_string(), d.format("%Y-%m-%d").to_string()))
            .collect();
        query.push(("file_type".to_string(), file_type.as_str().to_string()));
        self.get_bytes(config::EXPORT_ZIP_PATH, &query)
            .map_err(as_export)
    }
}

// ---------------------------------------------------------------------------
// SnapshotStore
// ---------------------------------------------------------------------------

impl SnapshotStore for HttpService {
    fn available_dates(&self) -> Result<Vec<NaiveDate>> {
        let resp: SnapshotDates = self
            .get_json(config::SNAPSHOT_DATES_PATH, &[])
            .map_err(as_export)?;
        let mut dates = resp.dates;
        dates.sort();
        Ok(dates)
    }

    fn save_snapshot(&self) -> Result<NaiveDate> {
        let saved: SavedSnapshot = self
            .send_json(self.client.post(self.url(config::SNAPSHOTS_PATH)))
            .map_err(as_export)?;
        Ok(saved.date)
    }

    fn delete_snapshot(&self, date: NaiveDate) -> Result<()> {
        let url = self.url(&format!("{}/{}", config::SNAPSHOTS_PATH, date.format("%Y-%m-%d")));
        self.client
            .delete(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| AnalyticsError::Export(e.to_string()))?;
        Ok(())
    }

    fn retention_settings(&self) -> Result<RetentionSettings> {
        self.get_json(config::SNAPSHOT_RETENTION_PATH, &[])
            .map_err(as_export)
    }

    fn update_retention_settings(&self, settings: RetentionSettings) -> Result<RetentionSettings> {
        self.send_json(
            self.client
                .put(self.url(config::SNAPSHOT_RETENTION_PATH))
                .json(&settings),
        )
        .map_err(as_export)
    }
}
