use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity and static attributes of an employee, as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "EmployeeID")]
    pub employee_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Role")]
    pub role: String,
}

/// Hours allocated vs. hours available over one reporting period.
///
/// Every field is optional on the wire; the calculator treats a missing
/// figure as malformed input rather than failing the whole feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadRecord {
    #[serde(default)]
    pub allocated_hours: Option<f64>,
    #[serde(default)]
    pub available_hours: Option<f64>,
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
}

#[cfg(test)]
impl WorkloadRecord {
    pub fn new(allocated_hours: f64, available_hours: f64) -> Self {
        Self {
            allocated_hours: Some(allocated_hours),
            available_hours: Some(available_hours),
            period_start: None,
            period_end: None,
        }
    }
}

/// One row of the input feed: the employee plus their workload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(flatten)]
    pub employee: Employee,
    #[serde(flatten)]
    pub workload: WorkloadRecord,
}
