//! Utilization calculator — derives a rate and status from one workload record.
//!
//! The thresholds below are the single authoritative classification policy.
//! The report endpoint, the local resolver and the LLM context all go through
//! `UtilizationStatus::from_rate`, so a displayed status and a textual answer
//! can never disagree.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use crate::models::employee::{Employee, EmployeeRecord, WorkloadRecord};

/// Below this rate (percent) an employee is underutilized.
pub const LOW_THRESHOLD: f64 = 70.0;
/// Above this rate (percent) an employee is overutilized.
pub const HIGH_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtilizationStatus {
    Underutilized,
    Optimal,
    Overutilized,
}

impl UtilizationStatus {
    /// Total over every rate. Both boundaries (exactly 70.0 and exactly 100.0)
    /// resolve to `Optimal`.
    pub fn from_rate(rate: f64) -> Self {
        if rate > HIGH_THRESHOLD {
            UtilizationStatus::Overutilized
        } else if rate >= LOW_THRESHOLD {
            UtilizationStatus::Optimal
        } else {
            // NaN lands here too, though `compute` never produces one.
            UtilizationStatus::Underutilized
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UtilizationStatus::Underutilized => "underutilized",
            UtilizationStatus::Optimal => "optimal",
            UtilizationStatus::Overutilized => "overutilized",
        }
    }
}

/// Derived per-employee metric. Holds only the rate; the status is always
/// recomputed from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationMetric<'a> {
    pub employee: &'a Employee,
    pub utilization_rate: f64,
}

impl UtilizationMetric<'_> {
    pub fn status(&self) -> UtilizationStatus {
        UtilizationStatus::from_rate(self.utilization_rate)
    }
}

impl Serialize for UtilizationMetric<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UtilizationMetric", 3)?;
        state.serialize_field("employee", self.employee)?;
        state.serialize_field("utilization_rate", &self.utilization_rate)?;
        state.serialize_field("status", &self.status())?;
        state.end()
    }
}

/// Why a workload record could not produce a real ratio.
#[derive(Debug, Clone, PartialEq, Error)]
enum InputError {
    #[error("{0} is missing")]
    MissingField(&'static str),

    #[error("{0} is invalid ({1})")]
    Invalid(&'static str, f64),
}

fn hours(value: Option<f64>, field: &'static str) -> Result<f64, InputError> {
    let value = value.ok_or(InputError::MissingField(field))?;
    if !value.is_finite() || value < 0.0 {
        return Err(InputError::Invalid(field, value));
    }
    Ok(value)
}

fn rate_for(workload: &WorkloadRecord) -> Result<f64, InputError> {
    let allocated = hours(workload.allocated_hours, "allocated_hours")?;
    let available = hours(workload.available_hours, "available_hours")?;

    // Zero capacity cannot be busy.
    if available == 0.0 {
        return Ok(0.0);
    }

    let rate = allocated / available * 100.0;
    if !rate.is_finite() {
        return Err(InputError::Invalid("utilization_rate", rate));
    }
    Ok(rate)
}

/// Computes the utilization metric for one employee.
///
/// Never fails: malformed workload data degrades to a zero rate, which
/// classifies as `Underutilized`.
pub fn compute<'a>(employee: &'a Employee, workload: &WorkloadRecord) -> UtilizationMetric<'a> {
    let utilization_rate = match rate_for(workload) {
        Ok(rate) => rate,
        Err(e) => {
            warn!(
                "Workload for employee {} is malformed: {e}; defaulting to 0%",
                employee.employee_id
            );
            0.0
        }
    };

    UtilizationMetric {
        employee,
        utilization_rate,
    }
}

/// Computes metrics for a whole feed, preserving its order.
pub fn compute_all(records: &[EmployeeRecord]) -> Vec<UtilizationMetric<'_>> {
    records
        .iter()
        .map(|r| compute(&r.employee, &r.workload))
        .collect()
}

/// Team-level roll-up of a metric sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationSummary {
    pub total_employees: usize,
    pub average_rate: f64,
    pub overutilized: usize,
    pub optimal: usize,
    pub underutilized: usize,
}

pub fn summarize(metrics: &[UtilizationMetric<'_>]) -> UtilizationSummary {
    let mut summary = UtilizationSummary {
        total_employees: metrics.len(),
        average_rate: 0.0,
        overutilized: 0,
        optimal: 0,
        underutilized: 0,
    };

    for metric in metrics {
        match metric.status() {
            UtilizationStatus::Overutilized => summary.overutilized += 1,
            UtilizationStatus::Optimal => summary.optimal += 1,
            UtilizationStatus::Underutilized => summary.underutilized += 1,
        }
    }

    if !metrics.is_empty() {
        let total: f64 = metrics.iter().map(|m| m.utilization_rate).sum();
        summary.average_rate = total / metrics.len() as f64;
    }

    summary
}
