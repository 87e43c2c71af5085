//! Query orchestration: validate, query once, normalize, combine.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::combine::combine;
use crate::error::{AnalyticsError, Result, ValidationError};
use crate::models::{
    CombinedResult, FieldSeries, FieldTemplate, FieldType, QueryOutcome, QueryParams, RawResponse,
    RawSeries, RecordKind, SeriesPoint,
};
use crate::normalize::normalize;
use crate::service::QueryService;
use crate::validate::validate_params;

/// Runs queries against a [`QueryService`] and keeps the last successful
/// parameters and outcome.
///
/// One instance serves one view or session. Calls take `&mut self`, so a
/// second run cannot start while one is in flight on the same instance.
/// Failed runs leave the previous parameters and outcome untouched and are
/// never retried.
pub struct QueryOrchestrator<S> {
    service: S,
    templates: Option<Vec<FieldTemplate>>,
    last_params: Option<QueryParams>,
    last_outcome: Option<QueryOutcome>,
}

impl<S: QueryService> QueryOrchestrator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            templates: None,
            last_params: None,
            last_outcome: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Parameters of the last successful run.
    pub fn last_params(&self) -> Option<&QueryParams> {
        self.last_params.as_ref()
    }

    /// Outcome of the last successful run.
    pub fn last_outcome(&self) -> Option<&QueryOutcome> {
        self.last_outcome.as_ref()
    }

    /// Validate and run a query.
    ///
    /// Single selections (and tasks) produce [`QueryOutcome::Single`];
    /// selections of two or more keys produce [`QueryOutcome::Combined`].
    pub fn run(&mut self, params: QueryParams) -> Result<&QueryOutcome> {
        if let Err(e) = check_selection(&params).and_then(|_| validate_params(&params)) {
            debug!(query = %params, error = %e, "query rejected");
            return Err(e.into());
        }

        let field_types = if params.kind() == RecordKind::Fields {
            self.resolve_field_types(params.selected())?
        } else {
            vec![None; params.selected().len()]
        };

        info!(query = %params, "running analytics query");
        let response = self.service.query(&params).map_err(|e| {
            warn!(query = %params, error = %e, "query service failed");
            upstream(e)
        })?;

        let outcome = if params.is_multi() {
            QueryOutcome::Combined(shape_multi(&params, &field_types, response)?)
        } else {
            let field_type = field_types.first().copied().flatten();
            let series = single_series(&params, response)?;
            QueryOutcome::Single(normalize(params.kind(), field_type, &series).map_err(upstream)?)
        };

        self.last_params = Some(params);
        Ok(&*self.last_outcome.insert(outcome))
    }

    // -- Selection helpers --------------------------------------------------

    /// Custom field templates, fetched once per instance.
    pub fn field_templates(&mut self) -> Result<&[FieldTemplate]> {
        if self.templates.is_none() {
            let templates = self.service.custom_field_templates().map_err(upstream)?;
            debug!(count = templates.len(), "loaded custom field templates");
            self.templates = Some(templates);
        }
        Ok(self.templates.as_deref().unwrap_or_default())
    }

    /// Drop cached templates so the next lookup refetches them.
    pub fn refresh_templates(&mut self) {
        self.templates = None;
    }

    pub fn populated_counters(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        self.service.populated_counters(start, end).map_err(upstream)
    }

    pub fn populated_timers(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        self.service.populated_timers(start, end).map_err(upstream)
    }

    fn resolve_field_types(&mut self, keys: &[String]) -> Result<Vec<Option<FieldType>>> {
        let templates = self.field_templates()?;
        keys.iter()
            .map(|key| {
                templates
                    .iter()
                    .find(|t| &t.key == key)
                    .map(|t| Some(t.field_type))
                    .ok_or_else(|| AnalyticsError::NotFound(format!("Unknown custom field: {}", key)))
            })
            .collect()
    }
}

fn check_selection(params: &QueryParams) -> std::result::Result<(), ValidationError> {
    if params.kind().requires_selection() && params.selected().is_empty() {
        return Err(ValidationError::EmptySelection(params.kind()));
    }
    Ok(())
}

/// Collaborator failures surface as upstream errors unless already classified.
fn upstream(e: AnalyticsError) -> AnalyticsError {
    match e {
        AnalyticsError::Upstream(_) | AnalyticsError::Validation(_) => e,
        other => AnalyticsError::Upstream(other.to_string()),
    }
}

fn single_series(params: &QueryParams, response: RawResponse) -> Result<RawSeries> {
    match response {
        RawResponse::Single(series) => Ok(series),
        RawResponse::Multi { mut fields, .. } => {
            let key = params.selected().first().ok_or_else(|| {
                AnalyticsError::Upstream("keyed response for a query without selection".to_string())
            })?;
            fields.remove(key).ok_or_else(|| {
                AnalyticsError::Upstream(format!("response has no series for '{}'", key))
            })
        }
    }
}

fn shape_multi(
    params: &QueryParams,
    field_types: &[Option<FieldType>],
    response: RawResponse,
) -> Result<CombinedResult> {
    let mut fields = match response {
        RawResponse::Multi { fields, .. } => fields,
        RawResponse::Single(_) => {
            return Err(AnalyticsError::Upstream(format!(
                "expected one series per key for {} selected {}",
                params.selected().len(),
                params.kind()
            )))
        }
    };

    let mut series = Vec::with_capacity(params.selected().len());
    for (key, field_type) in params.selected().iter().zip(field_types) {
        let raw = fields.remove(key).ok_or_else(|| {
            AnalyticsError::Upstream(format!("response has no series for '{}'", key))
        })?;
        series.push(FieldSeries {
            key: key.clone(),
            field_type: *field_type,
            series: normalize(params.kind(), *field_type, &raw).map_err(upstream)?,
        });
    }

    let points: Vec<&[SeriesPoint]> = series.iter().map(|f| f.series.data.as_slice()).collect();
    let combined = combine(&points, params.selected()).map_err(upstream)?;

    Ok(CombinedResult {
        field_keys: params.selected().to_vec(),
        fields: series,
        combined,
    })
}
