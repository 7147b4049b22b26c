//! Axum route handlers for the Utilization API.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::employee::EmployeeRecord;
use crate::state::AppState;
use crate::utilization::calculator::{
    compute, compute_all, summarize, UtilizationMetric, UtilizationSummary, HIGH_THRESHOLD,
    LOW_THRESHOLD,
};

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
}

impl Thresholds {
    pub fn current() -> Self {
        Self {
            low: LOW_THRESHOLD,
            high: HIGH_THRESHOLD,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ReportingPeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct UtilizationReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub period: ReportingPeriod,
    pub thresholds: Thresholds,
    pub summary: UtilizationSummary,
    pub metrics: Vec<UtilizationMetric<'a>>,
}

/// Earliest start and latest end across the feed.
pub fn reporting_period(records: &[EmployeeRecord]) -> ReportingPeriod {
    ReportingPeriod {
        start: records.iter().filter_map(|r| r.workload.period_start).min(),
        end: records.iter().filter_map(|r| r.workload.period_end).max(),
    }
}

pub(crate) async fn load_records(state: &AppState) -> Result<Vec<EmployeeRecord>, AppError> {
    state.feed.load().await.map_err(AppError::Feed)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/utilization
///
/// Recomputes every metric from the feed and returns them in feed order,
/// with a team summary and the thresholds used to classify them.
pub async fn handle_get_utilization(State(state): State<AppState>) -> Result<Response, AppError> {
    let records = load_records(&state).await?;
    let metrics = compute_all(&records);

    let report = UtilizationReport {
        generated_at: Utc::now(),
        period: reporting_period(&records),
        thresholds: Thresholds::current(),
        summary: summarize(&metrics),
        metrics,
    };

    Ok(Json(report).into_response())
}

/// GET /api/v1/utilization/:employee_id
pub async fn handle_get_employee(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Response, AppError> {
    let records = load_records(&state).await?;
    let record = records
        .iter()
        .find(|r| r.employee.employee_id == employee_id)
        .ok_or_else(|| AppError::NotFound(format!("Employee {employee_id} not found")))?;

    Ok(Json(compute(&record.employee, &record.workload)).into_response())
}
