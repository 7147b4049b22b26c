// Prompt constants and the context builder for the LLM-backed resolver.

use crate::utilization::calculator::{UtilizationMetric, HIGH_THRESHOLD, LOW_THRESHOLD};

/// Opening of the system context. Describes the assistant's role and task.
pub const CONTEXT_PREAMBLE: &str = "You are a resource utilization analysis assistant. \
    Answer questions about team workload using only the data below. \
    Utilization is allocated hours divided by available hours.";

/// Closing instruction appended after the data lines.
pub const CONTEXT_INSTRUCTION: &str =
    "Analyze this data and provide concise, factual insights about resource utilization.";

/// Serializes metrics into the system context sent to the completion endpoint.
///
/// One line per metric, in input order, never reordered or deduplicated, so
/// identical input always yields byte-identical output.
pub fn build_context(metrics: &[UtilizationMetric<'_>]) -> String {
    let lines: Vec<String> = metrics
        .iter()
        .map(|m| {
            format!(
                "{} ({}): {:.1}% utilization",
                m.employee.name, m.employee.role, m.utilization_rate
            )
        })
        .collect();

    format!(
        "{CONTEXT_PREAMBLE}\n{}\nHere's the current utilization data:\n{}\n\n{CONTEXT_INSTRUCTION}",
        threshold_line(),
        lines.join("\n")
    )
}

fn threshold_line() -> String {
    format!(
        "Below {LOW_THRESHOLD:.0}% is underutilized, {LOW_THRESHOLD:.0}% to {HIGH_THRESHOLD:.0}% is optimal, \
        above {HIGH_THRESHOLD:.0}% is overutilized."
    )
}
