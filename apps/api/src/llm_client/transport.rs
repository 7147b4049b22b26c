//! Network seam for the completion client.
//!
//! `HttpTransport` is the production implementation. Tests swap in a
//! recording transport to assert on call counts and request shape.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{ChatRequest, RequestError};

/// Raw status and body of one round trip. Interpretation is left to the client.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(
        &self,
        request: &ChatRequest,
        credential: &str,
    ) -> Result<TransportResponse, RequestError>;
}

/// POSTs the request as JSON with a bearer token.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(
        &self,
        request: &ChatRequest,
        credential: &str,
    ) -> Result<TransportResponse, RequestError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| RequestError::Transport(describe(e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RequestError::Transport(describe(e)))?;

        Ok(TransportResponse { status, body })
    }
}

/// Short failure description, without the endpoint URL.
fn describe(error: reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.without_url().to_string()
    }
}
