use crate::models::{Grouping, RecordKind};

/// Reasons a query request is rejected before anything is sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Both a start date and an end date are required")]
    MissingDate,

    #[error("End date must not be before start date")]
    InvertedRange,

    #[error(
        "Date range of {days} days is too wide for {kind} grouped by {grouping} (maximum {max_days} days)"
    )]
    RangeTooWide {
        kind: RecordKind,
        grouping: Grouping,
        days: i64,
        max_days: i64,
    },

    #[error("At least one selection is required for {0}")]
    EmptySelection(RecordKind),
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query service error: {0}")]
    Upstream(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AnalyticsError {
    /// True when the request was rejected locally and never reached a service.
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalyticsError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
