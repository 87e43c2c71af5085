//! Async wrapper around [`TrackerAnalytics`] for Tokio runtimes.
//!
//! Every operation runs on the blocking thread pool via
//! [`tokio::task::spawn_blocking`]. The wrapped instance sits behind a
//! [`Mutex`], so at most one query or export runs at a time per wrapper.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use tracker_analytics::{AsyncTrackerAnalytics, QueryParams};
//!
//! #[tokio::main]
//! async fn main() {
//!     let analytics = AsyncTrackerAnalytics::builder().build().await.unwrap();
//!
//!     let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!     let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//!     let outcome = analytics
//!         .run_query(QueryParams::tasks().range(jan1, jan31))
//!         .await
//!         .unwrap();
//!
//!     let csv = analytics.run(|a| a.exports().export_csv()).await.unwrap();
//! }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{AnalyticsError, Result};
use crate::http::HttpService;
use crate::models::{QueryOutcome, QueryParams};
use crate::service::QueryService;
use crate::{config, TrackerAnalytics};

// ---------------------------------------------------------------------------
// AsyncTrackerAnalyticsBuilder
// ---------------------------------------------------------------------------

/// Builder for a REST-backed [`AsyncTrackerAnalytics`].
pub struct AsyncTrackerAnalyticsBuilder {
    base_url: String,
    timeout: Duration,
}

impl Default for AsyncTrackerAnalyticsBuilder {
    fn default() -> Self {
        Self {
            base_url: config::DEFAULT_BASE_URL.to_string(),
            timeout: config::DEFAULT_TIMEOUT,
        }
    }
}

impl AsyncTrackerAnalyticsBuilder {
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client on the blocking pool (the blocking HTTP client
    /// must not be created inside the async runtime's worker threads).
    pub async fn build(self) -> Result<AsyncTrackerAnalytics<HttpService>> {
        tokio::task::spawn_blocking(move || {
            let analytics = TrackerAnalytics::builder()
                .base_url(&self.base_url)
                .timeout(self.timeout)
                .build()?;
            Ok(AsyncTrackerAnalytics::from_analytics(analytics))
        })
        .await
        .map_err(join_error)?
    }
}

// ---------------------------------------------------------------------------
// AsyncTrackerAnalytics
// ---------------------------------------------------------------------------

/// Async wrapper around [`TrackerAnalytics`].
///
/// Cloning shares the same underlying instance and lock.
pub struct AsyncTrackerAnalytics<S> {
    inner: Arc<Mutex<TrackerAnalytics<S>>>,
}

impl<S> Clone for AsyncTrackerAnalytics<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AsyncTrackerAnalytics<HttpService> {
    pub fn builder() -> AsyncTrackerAnalyticsBuilder {
        AsyncTrackerAnalyticsBuilder::default()
    }
}

impl<S: QueryService + Send + 'static> AsyncTrackerAnalytics<S> {
    pub fn from_analytics(analytics: TrackerAnalytics<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(analytics)),
        }
    }

    /// Run a sync operation on the blocking thread pool while holding the
    /// lock.
    ///
    /// ```no_run
    /// # use tracker_analytics::AsyncTrackerAnalytics;
    /// # async fn example() -> tracker_analytics::Result<()> {
    /// # let analytics = AsyncTrackerAnalytics::builder().build().await?;
    /// let templates = analytics.run(|a| Ok(a.field_templates()?.to_vec())).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TrackerAnalytics<S>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|_| AnalyticsError::InvalidArgument("analytics lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(join_error)?
    }

    /// Validate and run a query, returning a copy of the outcome.
    pub async fn run_query(&self, params: QueryParams) -> Result<QueryOutcome> {
        self.run(move |a| a.run(params).cloned()).await
    }

    /// Parameters of the last successful query.
    pub async fn last_params(&self) -> Result<Option<QueryParams>> {
        self.run(|a| Ok(a.last_params().cloned())).await
    }
}

fn join_error(e: tokio::task::JoinError) -> AnalyticsError {
    AnalyticsError::InvalidArgument(format!("Task join error: {e}"))
}
