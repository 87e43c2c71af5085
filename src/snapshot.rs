//! Gzipped JSON snapshots kept in a local directory.
//!
//! Each snapshot is one `snapshot-YYYY-MM-DD.json.gz` file. Retention
//! settings live next to them in `retention.json`; the oldest snapshots
//! beyond the configured count are pruned after every save and every
//! settings change.

use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config;
use crate::error::{AnalyticsError, Result};
use crate::models::RetentionSettings;
use crate::service::SnapshotStore;

const FILE_PREFIX: &str = "snapshot-";
const FILE_SUFFIX: &str = ".json.gz";
const RETENTION_FILE: &str = "retention.json";

/// Produces the snapshot document for a date.
pub type SnapshotSource = Box<dyn Fn(NaiveDate) -> Result<serde_json::Value> + Send>;

/// Filesystem-backed [`SnapshotStore`].
pub struct FsSnapshotStore {
    dir: PathBuf,
    source: SnapshotSource,
}

impl FsSnapshotStore {
    /// Create a store rooted at `dir`.
    ///
    /// If `dir` is `None`, uses the platform data directory. Creates the
    /// directory if it does not exist.
    pub fn new(dir: Option<PathBuf>, source: SnapshotSource) -> Result<Self> {
        let dir = dir.unwrap_or_else(config::default_snapshot_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, source })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", FILE_PREFIX, date.format("%Y-%m-%d"), FILE_SUFFIX))
    }

    /// Capture a snapshot for a specific date, replacing any existing one.
    ///
    /// Written to a temp file in the same directory and renamed on success,
    /// so an interrupted write never leaves a truncated snapshot behind.
    pub fn save_snapshot_for(&self, date: NaiveDate) -> Result<NaiveDate> {
        let document = (self.source)(date)?;

        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut encoder = GzEncoder::new(BufWriter::new(tmp.as_file()), Compression::default());
            serde_json::to_writer(&mut encoder, &document)?;
            encoder.finish()?.flush()?;
        }
        let path = self.path_for(date);
        tmp.persist(&path).map_err(|e| AnalyticsError::Io(e.error))?;
        info!(date = %date, path = %path.display(), "saved snapshot");

        self.prune(self.retention_settings()?.max_count)?;
        Ok(date)
    }

    /// Load a stored snapshot.
    ///
    /// A corrupt file is removed and reported as not found.
    pub fn load_snapshot(&self, date: NaiveDate) -> Result<serde_json::Value> {
        let path = self.path_for(date);
        if !path.exists() {
            return Err(AnalyticsError::NotFound(format!("No snapshot for {}", date)));
        }

        let parsed = (|| -> Result<serde_json::Value> {
            let mut contents = String::new();
            BufReader::new(GzDecoder::new(BufReader::new(fs::File::open(&path)?)))
                .read_to_string(&mut contents)?;
            Ok(serde_json::from_str(&contents)?)
        })();

        parsed.map_err(|e| {
            warn!(path = %path.display(), error = %e, "corrupt snapshot; removing");
            let _ = fs::remove_file(&path);
            AnalyticsError::NotFound(format!(
                "Snapshot for {} was corrupt and has been removed: {}",
                date, e
            ))
        })
    }

    /// Delete the oldest snapshots so at most `keep` remain.
    fn prune(&self, keep: usize) -> Result<()> {
        let dates = self.available_dates()?;
        if dates.len() <= keep {
            return Ok(());
        }
        let excess = dates.len() - keep;
        for date in &dates[..excess] {
            fs::remove_file(self.path_for(*date))?;
        }
        info!(removed = excess, kept = keep, "pruned snapshots");
        Ok(())
    }
}

fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

impl SnapshotStore for FsSnapshotStore {
    fn available_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(date) = entry.file_name().to_str().and_then(date_from_file_name) {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }

    fn save_snapshot(&self) -> Result<NaiveDate> {
        self.save_snapshot_for(chrono::Local::now().date_naive())
    }

    fn delete_snapshot(&self, date: NaiveDate) -> Result<()> {
        let path = self.path_for(date);
        if !path.exists() {
            return Err(AnalyticsError::NotFound(format!("No snapshot for {}", date)));
        }
        fs::remove_file(&path)?;
        debug!(date = %date, "deleted snapshot");
        Ok(())
    }

    fn retention_settings(&self) -> Result<RetentionSettings> {
        let path = self.dir.join(RETENTION_FILE);
        if !path.exists() {
            return Ok(RetentionSettings::default());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn update_retention_settings(&self, settings: RetentionSettings) -> Result<RetentionSettings> {
        if settings.max_count == 0 {
            return Err(AnalyticsError::InvalidArgument(
                "snapshot retention must keep at least one snapshot".to_string(),
            ));
        }
        fs::write(
            self.dir.join(RETENTION_FILE),
            serde_json::to_string_pretty(&settings)?,
        )?;
        self.prune(settings.max_count)?;
        Ok(settings)
    }
}
