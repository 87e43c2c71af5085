//! Date-range checks applied before any query leaves the process.
//!
//! Caps guard the query service against unbounded fine-grained aggregation:
//! tasks are always capped at a year, custom fields only when grouped by day
//! (or ungrouped) or by week, counters and timers not at all.

use chrono::NaiveDate;

use crate::config::{FIELDS_DAY_MAX_DAYS, FIELDS_WEEK_MAX_DAYS, TASKS_MAX_DAYS};
use crate::error::ValidationError;
use crate::models::{Grouping, QueryParams, RecordKind};

/// Maximum span in days for a kind and grouping, or `None` when uncapped.
pub fn max_days(kind: RecordKind, grouping: Grouping) -> Option<i64> {
    match kind {
        RecordKind::Tasks => Some(TASKS_MAX_DAYS),
        RecordKind::Fields => match grouping {
            Grouping::None | Grouping::Day => Some(FIELDS_DAY_MAX_DAYS),
            Grouping::Week => Some(FIELDS_WEEK_MAX_DAYS),
            Grouping::Month | Grouping::Year => None,
        },
        RecordKind::Counters | RecordKind::Timers => None,
    }
}

/// Validate a requested range. Rules apply in order: both dates present,
/// end not before start, span within the cap for `kind` and `grouping`.
pub fn validate_range(
    kind: RecordKind,
    grouping: Grouping,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(ValidationError::MissingDate),
    };

    if end < start {
        return Err(ValidationError::InvertedRange);
    }

    let days = (end - start).num_days();
    if let Some(max) = max_days(kind, grouping) {
        if days > max {
            return Err(ValidationError::RangeTooWide {
                kind,
                grouping,
                days,
                max_days: max,
            });
        }
    }
    Ok(())
}

/// Validate the range carried by a full query request.
pub fn validate_params(params: &QueryParams) -> Result<(), ValidationError> {
    validate_range(params.kind(), params.group_by(), params.start(), params.end())
}
