// Utilization engine: feed loading, metric derivation, status classification.
// Metrics are recomputed from the raw feed on every request and never stored.

pub mod calculator;
pub mod dataset;
pub mod handlers;
