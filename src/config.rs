use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_SNAPSHOT_RETENTION: usize = 30;

// Range caps, in whole days between start and end date.
pub const TASKS_MAX_DAYS: i64 = 365;
pub const FIELDS_DAY_MAX_DAYS: i64 = 365;
pub const FIELDS_WEEK_MAX_DAYS: i64 = 364;

// REST endpoints, relative to the base URL.
pub const TEMPLATES_PATH: &str = "/api/custom-field-templates";
pub const POPULATED_COUNTERS_PATH: &str = "/api/analytics/counters/populated";
pub const POPULATED_TIMERS_PATH: &str = "/api/analytics/timers/populated";
pub const EXPORT_ZIP_PATH: &str = "/api/snapshots/export-zip";
pub const SNAPSHOT_DATES_PATH: &str = "/api/snapshots/dates";
pub const SNAPSHOTS_PATH: &str = "/api/snapshots";
pub const SNAPSHOT_RETENTION_PATH: &str = "/api/snapshots/retention";

/// Analytics query endpoint for a record kind.
pub fn analytics_path(kind: &str) -> String {
    format!("/api/analytics/{}", kind)
}

/// Export endpoint for a record kind in the given format (`csv` or `excel`).
pub fn export_path(format: &str, kind: &str) -> String {
    format!("/api/export/{}/{}", format, kind)
}

pub fn default_snapshot_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("tracker-analytics").join("snapshots")
    } else {
        PathBuf::from(".tracker-analytics").join("snapshots")
    }
}
