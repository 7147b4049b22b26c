//! Query resolvers — one trait, two interchangeable backends.
//!
//! `LocalResolver` answers from keyword intents with no I/O.
//! `LlmResolver` serializes the metrics into a system context and delegates
//! to the completion endpoint.
//!
//! Handlers pick a backend per request through `ResolverBackend`, defaulting
//! to the configured one.

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::llm_client::{CompletionClient, RequestError};
use crate::query::local::resolve;
use crate::query::prompts::build_context;
use crate::utilization::calculator::UtilizationMetric;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverBackend {
    #[default]
    Local,
    Llm,
}

impl FromStr for ResolverBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ResolverBackend::Local),
            "llm" => Ok(ResolverBackend::Llm),
            other => anyhow::bail!("unknown query backend '{other}' (expected 'local' or 'llm')"),
        }
    }
}

/// Answers a question about utilization data. Implement this to add a
/// backend without touching the handler or session code.
#[async_trait]
pub trait QueryResolver: Send + Sync {
    async fn answer(
        &self,
        question: &str,
        metrics: &[UtilizationMetric<'_>],
    ) -> Result<String, RequestError>;

    /// "local" | "llm", echoed back to callers for transparency.
    fn backend(&self) -> ResolverBackend;
}

/// Deterministic keyword resolver. Never fails.
pub struct LocalResolver;

#[async_trait]
impl QueryResolver for LocalResolver {
    async fn answer(
        &self,
        question: &str,
        metrics: &[UtilizationMetric<'_>],
    ) -> Result<String, RequestError> {
        Ok(resolve(question, metrics))
    }

    fn backend(&self) -> ResolverBackend {
        ResolverBackend::Local
    }
}

/// Completion-backed resolver. Built per request: the credential belongs to
/// the caller and is dropped with the resolver.
pub struct LlmResolver {
    client: CompletionClient,
    credential: String,
}

impl LlmResolver {
    pub fn new(client: CompletionClient, credential: impl Into<String>) -> Self {
        Self {
            client,
            credential: credential.into(),
        }
    }
}

impl std::fmt::Debug for LlmResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmResolver")
            .field("model", &self.client.model())
            .field("credential", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl QueryResolver for LlmResolver {
    async fn answer(
        &self,
        question: &str,
        metrics: &[UtilizationMetric<'_>],
    ) -> Result<String, RequestError> {
        let context = build_context(metrics);
        self.client.ask(question, &context, &self.credential).await
    }

    fn backend(&self) -> ResolverBackend {
        ResolverBackend::Llm
    }
}
