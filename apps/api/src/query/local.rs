//! Local query resolver — keyword intent matching over computed metrics.
//!
//! Pure and synchronous. Every question produces an answer; questions that
//! match no intent get `FALLBACK_ANSWER`.
//!
//! Classification order:
//! 1. overutilized keywords → `WhoIsOverutilized`
//! 2. underutilized keywords → `WhoIsUnderutilized`
//! 3. an employee name in the question → `EmployeeLookup` (first in input order)
//! 4. summary keywords → `GeneralSummary`
//! 5. otherwise `Unrecognized`

use crate::utilization::calculator::{summarize, UtilizationMetric, UtilizationStatus};

pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't understand that question. \
    Try asking who is overutilized, who is underutilized, about a specific employee by name, \
    or for a team utilization summary.";

const OVER_KEYWORDS: &[&str] = &[
    "overutilized",
    "over-utilized",
    "over utilized",
    "overutilised",
    "overloaded",
    "overworked",
    "over capacity",
];

const UNDER_KEYWORDS: &[&str] = &[
    "underutilized",
    "under-utilized",
    "under utilized",
    "underutilised",
    "idle",
    "spare capacity",
    "available capacity",
];

const SUMMARY_KEYWORDS: &[&str] = &[
    "summary",
    "summarize",
    "summarise",
    "overview",
    "overall",
    "average",
    "team",
    "everyone",
    "utilization",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryIntent {
    WhoIsOverutilized,
    WhoIsUnderutilized,
    /// Index into the metric slice of the first matching employee.
    EmployeeLookup(usize),
    GeneralSummary,
    Unrecognized,
}

/// True when any keyword appears as a whole word, or as a run of whole words
/// for multi-word keywords ("over capacity", "under-utilized").
fn contains_any(question_words: &[&str], keywords: &[&str]) -> bool {
    keywords.iter().any(|k| {
        let phrase = words(k);
        !phrase.is_empty()
            && question_words
                .windows(phrase.len())
                .any(|window| window == phrase.as_slice())
    })
}

/// Lowercased alphanumeric words of the question.
fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Case-insensitive name match: the full name as a substring, or any part of
/// the name (two characters or more) as a whole word of the question.
fn mentions(question_lower: &str, question_words: &[&str], name: &str) -> bool {
    let name_lower = name.trim().to_lowercase();
    if name_lower.is_empty() {
        return false;
    }
    if question_lower.contains(&name_lower) {
        return true;
    }
    name_lower
        .split_whitespace()
        .filter(|part| part.chars().count() >= 2)
        .any(|part| question_words.contains(&part))
}

pub fn classify(question: &str, metrics: &[UtilizationMetric<'_>]) -> QueryIntent {
    let q = question.to_lowercase();
    let question_words = words(&q);

    if contains_any(&question_words, OVER_KEYWORDS) {
        return QueryIntent::WhoIsOverutilized;
    }
    if contains_any(&question_words, UNDER_KEYWORDS) {
        return QueryIntent::WhoIsUnderutilized;
    }

    if let Some(idx) = metrics
        .iter()
        .position(|m| mentions(&q, &question_words, &m.employee.name))
    {
        return QueryIntent::EmployeeLookup(idx);
    }

    if contains_any(&question_words, SUMMARY_KEYWORDS) {
        return QueryIntent::GeneralSummary;
    }

    QueryIntent::Unrecognized
}

/// Answers a question about the given metrics. Never panics.
pub fn resolve(question: &str, metrics: &[UtilizationMetric<'_>]) -> String {
    match classify(question, metrics) {
        QueryIntent::WhoIsOverutilized => {
            list_by_status(metrics, UtilizationStatus::Overutilized)
        }
        QueryIntent::WhoIsUnderutilized => {
            list_by_status(metrics, UtilizationStatus::Underutilized)
        }
        QueryIntent::EmployeeLookup(idx) => describe_employee(&metrics[idx]),
        QueryIntent::GeneralSummary => describe_team(metrics),
        QueryIntent::Unrecognized => FALLBACK_ANSWER.to_string(),
    }
}

fn list_by_status(metrics: &[UtilizationMetric<'_>], status: UtilizationStatus) -> String {
    let matching: Vec<String> = metrics
        .iter()
        .filter(|m| m.status() == status)
        .map(|m| format!("{} ({:.1}%)", m.employee.name, m.utilization_rate))
        .collect();

    if matching.is_empty() {
        return format!("No one is currently {}.", status.label());
    }

    let noun = if matching.len() == 1 { "employee is" } else { "employees are" };
    format!(
        "{} {noun} {}: {}.",
        matching.len(),
        status.label(),
        matching.join(", ")
    )
}

fn describe_employee(metric: &UtilizationMetric<'_>) -> String {
    format!(
        "{} ({}) is at {:.1}% utilization, which is {}.",
        metric.employee.name,
        metric.employee.role,
        metric.utilization_rate,
        metric.status().label()
    )
}

fn describe_team(metrics: &[UtilizationMetric<'_>]) -> String {
    if metrics.is_empty() {
        return "No utilization data is available for this period.".to_string();
    }

    let summary = summarize(metrics);
    format!(
        "Average team utilization is {:.1}% across {} employees: \
        {} overutilized, {} optimal, {} underutilized.",
        summary.average_rate,
        summary.total_employees,
        summary.overutilized,
        summary.optimal,
        summary.underutilized
    )
}
