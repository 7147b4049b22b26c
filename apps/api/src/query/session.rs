//! Session state — the explicit record a caller sends with each query and
//! receives back, updated.
//!
//! Holds the displayed conversation, the request state machine, the last
//! error and a request sequence number. Never holds the credential.
//!
//! State machine: `Idle → Pending → {Succeeded, Failed}`. A new question
//! re-enters `Pending` and bumps the sequence number; an outcome carrying an
//! older token is discarded so a stale answer is never applied.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::llm_client::RequestError;
use crate::models::conversation::ConversationTurn;
use crate::query::resolver::QueryResolver;
use crate::utilization::calculator::UtilizationMetric;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session {0} has exhausted its request sequence; start a new session")]
    SequenceExhausted(Uuid),
}

/// Identifies one in-flight question within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: Uuid,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub request: RequestState,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub request_seq: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            history: Vec::new(),
            request: RequestState::Idle,
            last_error: None,
            request_seq: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.request == RequestState::Pending
    }

    /// Records the user's question and moves to `Pending`.
    ///
    /// The sequence number arrives from the caller, so it may already be at
    /// `u64::MAX`; the session is left untouched in that case.
    pub fn begin(&mut self, question: &str) -> Result<RequestToken, SessionError> {
        self.request_seq = self
            .request_seq
            .checked_add(1)
            .ok_or(SessionError::SequenceExhausted(self.session_id))?;
        self.history.push(ConversationTurn::user(question));
        self.request = RequestState::Pending;
        self.last_error = None;
        Ok(RequestToken(self.request_seq))
    }

    /// Applies an outcome. Returns `false` (and changes nothing) when the
    /// token is stale or no request is pending.
    pub fn complete(&mut self, token: RequestToken, outcome: Result<String, RequestError>) -> bool {
        if token.0 != self.request_seq || !self.is_pending() {
            debug!(
                "Discarding stale outcome for request {} (latest {})",
                token.0, self.request_seq
            );
            return false;
        }

        match outcome {
            Ok(answer) => {
                self.history.push(ConversationTurn::assistant(answer));
                self.request = RequestState::Succeeded;
            }
            Err(e) => {
                warn!("Query {} failed: {e}", token.0);
                self.last_error = Some(e.to_string());
                self.request = RequestState::Failed;
            }
        }
        true
    }
}

/// Runs one question through a resolver, threading the session through.
///
/// Returns the updated session and the answer, if there was one. Fails
/// before consulting the resolver when the session cannot take a new question.
pub async fn interact(
    mut session: SessionState,
    question: &str,
    resolver: &dyn QueryResolver,
    metrics: &[UtilizationMetric<'_>],
) -> Result<(SessionState, Option<String>), SessionError> {
    let token = session.begin(question)?;
    let outcome = resolver.answer(question, metrics).await;
    let answer = outcome.as_ref().ok().cloned();
    session.complete(token, outcome);
    Ok((session, answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::tests::{RecordingTransport, OK_BODY};
    use crate::llm_client::CompletionClient;
    use crate::models::conversation::TurnRole;
    use crate::models::employee::{Employee, WorkloadRecord};
    use crate::query::resolver::{LlmResolver, LocalResolver};
    use crate::utilization::calculator::compute;
    use std::sync::Arc;

    #[test]
    fn test_new_session_is_idle() {
        let session = SessionState::new();
        assert_eq!(session.request, RequestState::Idle);
        assert!(session.history.is_empty());
        assert_eq!(session.request_seq, 0);
    }

    #[test]
    fn test_success_path_appends_assistant_turn() {
        let mut session = SessionState::new();
        let token = session.begin("Who is overutilized?").unwrap();
        assert!(session.is_pending());

        assert!(session.complete(token, Ok("Alice".into())));
        assert_eq!(session.request, RequestState::Succeeded);
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, TurnRole::User);
        assert_eq!(session.history[1], ConversationTurn::assistant("Alice"));
        assert!(session.last_error.is_none());
    }

    #[test]
    fn test_failure_records_error_message() {
        let mut session = SessionState::new();
        let token = session.begin("q").unwrap();
        session.complete(token, Err(RequestError::MissingCredential));

        assert_eq!(session.request, RequestState::Failed);
        assert_eq!(
            session.last_error.as_deref(),
            Some("An API key is required to query the completion service")
        );
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let mut session = SessionState::new();
        let first = session.begin("first question").unwrap();
        let second = session.begin("second question").unwrap();

        assert!(!session.complete(first, Ok("old answer".into())));
        assert!(session.is_pending());

        assert!(session.complete(second, Ok("new answer".into())));
        let texts: Vec<&str> = session.history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first question", "second question", "new answer"]);
    }

    #[test]
    fn test_terminal_state_ignores_repeat_completion() {
        let mut session = SessionState::new();
        let token = session.begin("q").unwrap();
        assert!(session.complete(token, Ok("a".into())));
        assert!(!session.complete(token, Err(RequestError::Transport("late".into()))));
        assert_eq!(session.request, RequestState::Succeeded);
    }

    #[test]
    fn test_new_question_clears_last_error() {
        let mut session = SessionState::new();
        let token = session.begin("q").unwrap();
        session.complete(token, Err(RequestError::Transport("reset".into())));
        assert!(session.last_error.is_some());

        session.begin("again").unwrap();
        assert!(session.last_error.is_none());
        assert_eq!(session.request_seq, 2);
    }

    #[test]
    fn test_session_deserializes_with_defaults() {
        let id = Uuid::new_v4();
        let session: SessionState =
            serde_json::from_str(&format!(r#"{{"session_id":"{id}"}}"#)).unwrap();
        assert_eq!(session.session_id, id);
        assert_eq!(session.request, RequestState::Idle);
    }

    #[test]
    fn test_exhausted_sequence_is_rejected_without_change() {
        let mut session = SessionState::new();
        session.request_seq = u64::MAX;
        let before = session.clone();

        let err = session.begin("q").unwrap_err();
        assert_eq!(err, SessionError::SequenceExhausted(session.session_id));
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn test_interact_with_exhausted_session_never_resolves() {
        let transport = Arc::new(RecordingTransport::responding(200, OK_BODY));
        let resolver = LlmResolver::new(CompletionClient::new(transport.clone(), "m"), "key");
        let id = Uuid::new_v4();
        let session: SessionState = serde_json::from_str(&format!(
            r#"{{"session_id":"{id}","request_seq":18446744073709551615}}"#
        ))
        .unwrap();

        let result = interact(session, "team summary", &resolver, &[]).await;
        assert!(matches!(result, Err(SessionError::SequenceExhausted(sid)) if sid == id));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_interact_end_to_end_local() {
        let alice = Employee {
            employee_id: "E1".into(),
            name: "Alice".into(),
            role: "Developer".into(),
        };
        let bob = Employee {
            employee_id: "E2".into(),
            name: "Bob".into(),
            role: "Manager".into(),
        };
        let metrics = vec![
            compute(&alice, &WorkloadRecord::new(45.0, 40.0)),
            compute(&bob, &WorkloadRecord::new(32.0, 40.0)),
        ];

        let (session, answer) =
            interact(SessionState::new(), "Who is overutilized?", &LocalResolver, &metrics)
                .await
                .unwrap();

        let answer = answer.unwrap();
        assert!(answer.contains("Alice"));
        assert!(!answer.contains("Bob"));
        assert_eq!(session.request, RequestState::Succeeded);
        assert_eq!(session.history.len(), 2);
    }

    #[tokio::test]
    async fn test_interact_surfaces_llm_failure_in_session() {
        let transport = Arc::new(RecordingTransport::responding(500, "boom"));
        let resolver = LlmResolver::new(CompletionClient::new(transport, "m"), "key");

        let (session, answer) = interact(SessionState::new(), "q", &resolver, &[]).await.unwrap();
        assert!(answer.is_none());
        assert_eq!(session.request, RequestState::Failed);
        assert!(session.last_error.unwrap().contains("status 500"));
    }

    #[tokio::test]
    async fn test_interact_llm_success() {
        let transport = Arc::new(RecordingTransport::responding(200, OK_BODY));
        let resolver = LlmResolver::new(CompletionClient::new(transport, "m"), "key");

        let (session, answer) = interact(SessionState::new(), "q", &resolver, &[]).await.unwrap();
        assert_eq!(answer.as_deref(), Some("Alice is overloaded."));
        assert_eq!(session.request, RequestState::Succeeded);
    }
}
