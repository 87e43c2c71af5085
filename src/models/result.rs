use serde::Serialize;

use super::series::{CombinedPoint, SeriesPoint};
use super::summary::{NumericSummary, Summary};
use super::template::FieldType;

// ---------------------------------------------------------------------------
// SeriesResult — one normalized series and its summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesResult {
    pub data: Vec<SeriesPoint>,
    /// `None` when the query returned no buckets.
    pub summary: Option<Summary>,
}

impl SeriesResult {
    pub fn has_data(&self) -> bool {
        !self.data.is_empty() && self.summary.is_some()
    }
}

// ---------------------------------------------------------------------------
// Multi-selection results
// ---------------------------------------------------------------------------

/// A single selected key's own series inside a multi-selection result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSeries {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(flatten)]
    pub series: SeriesResult,
}

/// Bucket-wise sum of several series plus statistics of that sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedSeries {
    pub data: Vec<CombinedPoint>,
    pub summary: Option<NumericSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedResult {
    pub field_keys: Vec<String>,
    pub fields: Vec<FieldSeries>,
    pub combined: CombinedSeries,
}

// ---------------------------------------------------------------------------
// QueryOutcome
// ---------------------------------------------------------------------------

/// What a successful query run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Single(SeriesResult),
    Combined(CombinedResult),
}

impl QueryOutcome {
    /// False when there is nothing to chart. Callers treat this as "no data",
    /// never as an error.
    pub fn has_data(&self) -> bool {
        match self {
            QueryOutcome::Single(s) => s.has_data(),
            QueryOutcome::Combined(c) => {
                !c.combined.data.is_empty() && c.combined.summary.is_some()
            }
        }
    }

    pub fn as_single(&self) -> Option<&SeriesResult> {
        match self {
            QueryOutcome::Single(s) => Some(s),
            QueryOutcome::Combined(_) => None,
        }
    }

    pub fn as_combined(&self) -> Option<&CombinedResult> {
        match self {
            QueryOutcome::Combined(c) => Some(c),
            QueryOutcome::Single(_) => None,
        }
    }
}
