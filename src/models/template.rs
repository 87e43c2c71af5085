use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FieldType — declared type of a custom field
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Number,
    Currency,
    Text,
    Date,
    Time,
    Datetime,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::Currency => "currency",
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Datetime => "datetime",
        }
    }

    /// Number and currency fields carry measurements; everything else is counted.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Currency)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FieldTemplate — one registered custom field
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTemplate {
    pub id: i64,
    pub key: String,
    pub field_type: FieldType,
}

// ---------------------------------------------------------------------------
// Export and snapshot contracts
// ---------------------------------------------------------------------------

/// Content of a snapshot zip archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZipFileType {
    Markdown,
    Pdf,
    Csv,
    Both,
    All,
}

impl ZipFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZipFileType::Markdown => "markdown",
            ZipFileType::Pdf => "pdf",
            ZipFileType::Csv => "csv",
            ZipFileType::Both => "both",
            ZipFileType::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionSettings {
    pub max_count: usize,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            max_count: crate::config::DEFAULT_SNAPSHOT_RETENTION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedItem {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulatedCounters {
    #[serde(default)]
    pub counters: Vec<NamedItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulatedTimers {
    #[serde(default)]
    pub timers: Vec<NamedItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDates {
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}
