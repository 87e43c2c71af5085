//! Export dispatch.
//!
//! Replays the parameters of the last successful query against an
//! [`ExportService`]. Parameters were validated when the query ran, so
//! nothing is re-checked here.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{AnalyticsError, Result};
use crate::models::{QueryParams, ZipFileType};
use crate::service::ExportService;

/// Borrows an export service and the parameters to replay.
pub struct ExportDispatcher<'a, E: ?Sized> {
    service: &'a E,
    params: Option<&'a QueryParams>,
}

impl<'a, E: ExportService + ?Sized> ExportDispatcher<'a, E> {
    /// `params` is normally the orchestrator's last successful query.
    pub fn new(service: &'a E, params: Option<&'a QueryParams>) -> Self {
        Self { service, params }
    }

    /// The parameters exports will use, if a query has run.
    pub fn params(&self) -> Option<&'a QueryParams> {
        self.params
    }

    /// Export the last query's records as CSV.
    pub fn export_csv(&self) -> Result<Vec<u8>> {
        let params = self.require_params()?;
        info!(query = %params, "exporting csv");
        self.service
            .export_csv(params.kind(), params)
            .map_err(export_error)
    }

    /// Export the last query's records as an Excel workbook.
    pub fn export_excel(&self) -> Result<Vec<u8>> {
        let params = self.require_params()?;
        info!(query = %params, "exporting excel");
        self.service
            .export_excel(params.kind(), params)
            .map_err(export_error)
    }

    /// Bundle stored snapshots for `dates` into a zip archive.
    pub fn export_zip(&self, dates: &[NaiveDate], file_type: ZipFileType) -> Result<Vec<u8>> {
        info!(dates = dates.len(), file_type = file_type.as_str(), "exporting snapshot zip");
        self.service
            .export_zip(dates, file_type)
            .map_err(export_error)
    }

    fn require_params(&self) -> Result<&'a QueryParams> {
        self.params.ok_or_else(|| {
            AnalyticsError::NotFound("no query has been run yet; nothing to export".to_string())
        })
    }
}

pub(crate) fn export_error(e: AnalyticsError) -> AnalyticsError {
    match e {
        AnalyticsError::Export(_) => e,
        other => {
            warn!(error = %other, "export failed");
            AnalyticsError::Export(other.to_string())
        }
    }
}
