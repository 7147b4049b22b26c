//! Axum route handlers for the Query API.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::query::resolver::{LlmResolver, LocalResolver, QueryResolver, ResolverBackend};
use crate::query::session::{interact, SessionState};
use crate::state::AppState;
use crate::utilization::calculator::{compute_all, UtilizationMetric};
use crate::utilization::handlers::load_records;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct QueryRequest {
    pub question: String,
    /// Falls back to the configured default backend.
    #[serde(default)]
    pub backend: Option<ResolverBackend>,
    /// Caller's completion credential. Used for this request only.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Absent on the first question of a session.
    #[serde(default)]
    pub session: Option<SessionState>,
}

#[derive(Serialize)]
pub struct QueryResponse<'a> {
    pub answer: Option<String>,
    pub backend: ResolverBackend,
    pub session: SessionState,
    /// Returned on failure too, so the caller never loses its chart data.
    pub metrics: Vec<UtilizationMetric<'a>>,
}

fn select_resolver(
    state: &AppState,
    backend: ResolverBackend,
    api_key: Option<String>,
) -> Box<dyn QueryResolver> {
    match backend {
        ResolverBackend::Local => Box::new(LocalResolver),
        ResolverBackend::Llm => Box::new(LlmResolver::new(
            state.completion.clone(),
            api_key.unwrap_or_default(),
        )),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/query
///
/// Answers one question against freshly computed metrics. Resolver failures
/// come back as a `Failed` session with `last_error` set, not as an HTTP error.
pub async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Response, AppError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let records = load_records(&state).await?;
    let metrics = compute_all(&records);

    let backend = request.backend.unwrap_or(state.config.default_backend);
    let resolver = select_resolver(&state, backend, request.api_key);
    let session = request.session.unwrap_or_default();
    info!(
        "Query for session {} via {:?} backend",
        session.session_id, backend
    );

    let (session, answer) = interact(session, question, resolver.as_ref(), &metrics)
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(Json(QueryResponse {
        answer,
        backend: resolver.backend(),
        session,
        metrics,
    })
    .into_response())
}
