use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RecordKind
// ---------------------------------------------------------------------------

/// The family of tracked records a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Tasks,
    Fields,
    Counters,
    Timers,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Tasks => "tasks",
            RecordKind::Fields => "fields",
            RecordKind::Counters => "counters",
            RecordKind::Timers => "timers",
        }
    }

    /// Whether a query of this kind needs at least one selected key or name.
    pub fn requires_selection(&self) -> bool {
        !matches!(self, RecordKind::Tasks)
    }

    /// Query-string key carrying the selection, if the kind has one.
    pub fn selection_param(&self) -> Option<&'static str> {
        match self {
            RecordKind::Tasks => None,
            RecordKind::Fields => Some("field_keys"),
            RecordKind::Counters => Some("counter_names"),
            RecordKind::Timers => Some("timer_names"),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Temporal resolution of the buckets returned by a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    None,
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Grouping {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grouping::None => "none",
            Grouping::Day => "day",
            Grouping::Week => "week",
            Grouping::Month => "month",
            Grouping::Year => "year",
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CompletionStatus
// ---------------------------------------------------------------------------

/// Task completion filter. Ignored for every kind other than tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::All => "all",
            CompletionStatus::Completed => "completed",
            CompletionStatus::Incomplete => "incomplete",
        }
    }
}

// ---------------------------------------------------------------------------
// QueryParams
// ---------------------------------------------------------------------------

/// A complete query request.
///
/// Built with the kind constructors and chained setters, then handed by value
/// to the orchestrator. Once submitted it is only ever shared by reference, so
/// the export path replays exactly the scope that was queried.
///
/// The selection is an ordered set: duplicates are dropped, first occurrence
/// wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    kind: RecordKind,
    selection: Vec<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    grouping: Grouping,
    completion_status: CompletionStatus,
}

impl QueryParams {
    /// Start a query for the given kind with an empty selection and no dates.
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            selection: Vec::new(),
            start_date: None,
            end_date: None,
            grouping: Grouping::default(),
            completion_status: CompletionStatus::default(),
        }
    }

    pub fn tasks() -> Self {
        Self::new(RecordKind::Tasks)
    }

    pub fn fields<S: AsRef<str>>(keys: &[S]) -> Self {
        Self::new(RecordKind::Fields).selection(keys)
    }

    pub fn counters<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(RecordKind::Counters).selection(names)
    }

    pub fn timers<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(RecordKind::Timers).selection(names)
    }

    /// Replace the selection. Order is kept, duplicates and blank names dropped.
    pub fn selection<S: AsRef<str>>(mut self, keys: &[S]) -> Self {
        self.selection.clear();
        for key in keys {
            let key = key.as_ref().trim();
            if key.is_empty() || self.selection.iter().any(|k| k == key) {
                continue;
            }
            self.selection.push(key.to_string());
        }
        self
    }

    pub fn range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = date;
        self
    }

    pub fn end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.end_date = date;
        self
    }

    pub fn grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn completion_status(mut self, status: CompletionStatus) -> Self {
        self.completion_status = status;
        self
    }

    // -- Accessors ---------------------------------------------------------

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn selected(&self) -> &[String] {
        &self.selection
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn group_by(&self) -> Grouping {
        self.grouping
    }

    pub fn status(&self) -> CompletionStatus {
        self.completion_status
    }

    /// True when more than one key is selected and the result is combined.
    pub fn is_multi(&self) -> bool {
        self.kind.requires_selection() && self.selection.len() > 1
    }

    /// Canonical query-string pairs for this request.
    ///
    /// Every outbound request derived from a query (the query itself and any
    /// export of it) is built from this list.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(start) = self.start_date {
            pairs.push(("start_date".to_string(), start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date".to_string(), end.format("%Y-%m-%d").to_string()));
        }
        pairs.push(("group_by".to_string(), self.grouping.as_str().to_string()));

        if let Some(param) = self.kind.selection_param() {
            for key in &self.selection {
                pairs.push((param.to_string(), key.clone()));
            }
        }

        if self.kind == RecordKind::Tasks && self.completion_status != CompletionStatus::All {
            pairs.push((
                "completion_status".to_string(),
                self.completion_status.as_str().to_string(),
            ));
        }
        pairs
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
        write!(
            f,
            "{}[{}] {}..{} by {}",
            self.kind,
            self.selection.join(", "),
            date(self.start_date),
            date(self.end_date),
            self.grouping
        )
    }
}
