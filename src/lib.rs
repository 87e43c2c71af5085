//! Client-side analytics pipeline for a personal tracking app.
//!
//! Validates query ranges, asks a query service for per-bucket records,
//! normalizes them into typed time series with summaries, combines
//! multi-key selections into one series, and replays the last query's
//! parameters for exports.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use tracker_analytics::{QueryParams, TrackerAnalytics};
//!
//! let mut analytics = TrackerAnalytics::builder().build().unwrap();
//!
//! let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//! let outcome = analytics
//!     .run(QueryParams::counters(&["coffee", "water"]).range(jan1, jan31))
//!     .unwrap();
//! assert!(outcome.as_combined().is_some());
//!
//! let csv = analytics.exports().export_csv().unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod combine;
pub mod config;
pub mod connection;
pub mod error;
pub mod export;
pub mod http;
pub mod local;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod service;
pub mod snapshot;
pub mod sql_builder;
pub mod validate;

#[cfg(feature = "async")]
pub use async_client::AsyncTrackerAnalytics;
pub use combine::combine;
pub use connection::Connection;
pub use error::{AnalyticsError, Result, ValidationError};
pub use export::ExportDispatcher;
pub use http::HttpService;
pub use local::LocalQueryService;
pub use models::*;
pub use normalize::normalize;
pub use orchestrator::QueryOrchestrator;
pub use service::{ExportService, QueryService, SnapshotStore};
pub use snapshot::FsSnapshotStore;
pub use sql_builder::SqlBuilder;
pub use validate::{max_days, validate_params, validate_range};

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// TrackerAnalyticsBuilder
// ---------------------------------------------------------------------------

/// Builder for a [`TrackerAnalytics`] talking to the tracker REST API.
///
/// Use [`TrackerAnalytics::builder()`] to obtain a builder.
pub struct TrackerAnalyticsBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for TrackerAnalyticsBuilder {
    fn default() -> Self {
        Self {
            base_url: config::DEFAULT_BASE_URL.to_string(),
            timeout: config::DEFAULT_TIMEOUT,
        }
    }
}

impl TrackerAnalyticsBuilder {
    /// Set the API base URL. Defaults to `http://localhost:8000`.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Set the HTTP request timeout. Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client. No request is made until the first query.
    pub fn build(self) -> Result<TrackerAnalytics<HttpService>> {
        let service = HttpService::new(&self.base_url, self.timeout)?;
        Ok(TrackerAnalytics::new(service))
    }
}

// ---------------------------------------------------------------------------
// TrackerAnalytics
// ---------------------------------------------------------------------------

/// The main entry point: an orchestrator plus export and snapshot access
/// over one service.
pub struct TrackerAnalytics<S> {
    orchestrator: QueryOrchestrator<S>,
}

impl TrackerAnalytics<HttpService> {
    /// Create a builder for the REST-backed client.
    pub fn builder() -> TrackerAnalyticsBuilder {
        TrackerAnalyticsBuilder::default()
    }
}

impl<S: QueryService> TrackerAnalytics<S> {
    pub fn new(service: S) -> Self {
        Self {
            orchestrator: QueryOrchestrator::new(service),
        }
    }

    // -- Queries -------------------------------------------------------------

    /// Validate and run a query. See [`QueryOrchestrator::run`].
    pub fn run(&mut self, params: QueryParams) -> Result<&QueryOutcome> {
        self.orchestrator.run(params)
    }

    pub fn last_params(&self) -> Option<&QueryParams> {
        self.orchestrator.last_params()
    }

    pub fn last_outcome(&self) -> Option<&QueryOutcome> {
        self.orchestrator.last_outcome()
    }

    /// Custom field templates, fetched once and cached.
    pub fn field_templates(&mut self) -> Result<&[FieldTemplate]> {
        self.orchestrator.field_templates()
    }

    pub fn refresh_templates(&mut self) {
        self.orchestrator.refresh_templates()
    }

    /// Counters with entries in the range, for building a selection.
    pub fn populated_counters(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        self.orchestrator.populated_counters(start, end)
    }

    /// Timers with entries in the range, for building a selection.
    pub fn populated_timers(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        self.orchestrator.populated_timers(start, end)
    }

    pub fn orchestrator(&self) -> &QueryOrchestrator<S> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut QueryOrchestrator<S> {
        &mut self.orchestrator
    }

    pub fn service(&self) -> &S {
        self.orchestrator.service()
    }

    // -- Exports and snapshots -----------------------------------------------

    /// Export dispatcher bound to the last successful query, using a
    /// separate export service.
    pub fn exports_with<'a, E: ExportService + ?Sized>(
        &'a self,
        service: &'a E,
    ) -> ExportDispatcher<'a, E> {
        ExportDispatcher::new(service, self.orchestrator.last_params())
    }
}

impl<S: QueryService + ExportService> TrackerAnalytics<S> {
    /// Export dispatcher bound to the last successful query.
    pub fn exports(&self) -> ExportDispatcher<'_, S> {
        ExportDispatcher::new(self.orchestrator.service(), self.orchestrator.last_params())
    }
}

impl<S: QueryService + SnapshotStore> TrackerAnalytics<S> {
    /// The service's snapshot store.
    pub fn snapshots(&self) -> &dyn SnapshotStore {
        self.orchestrator.service()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl<S: QueryService> fmt::Display for TrackerAnalytics<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.orchestrator.last_params() {
            Some(params) => write!(f, "TrackerAnalytics(last query: {})", params),
            None => write!(f, "TrackerAnalytics(no query run)"),
        }
    }
}
