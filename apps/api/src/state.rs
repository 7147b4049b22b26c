use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::utilization::dataset::EmployeeFeed;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable handles only; per-user state travels in the request as `SessionState`.
#[derive(Clone)]
pub struct AppState {
    /// Raw employee records. Metrics are recomputed from it on every request.
    pub feed: EmployeeFeed,
    pub completion: CompletionClient,
    pub config: Config,
}
