//! HTTP implementations of the remote service ports.
//!
//! Talks to the study-app backend: `POST /api/chatbot/query` for questions
//! and `DELETE /api/chatbot/history/{user_id}/{plan_id}` for the
//! clear-history action.

use crate::capability::query::{HistoryService, QueryRequest, QueryResponse, QueryService};
use crate::config::QueryConfig;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Question-answering client for the study-app backend.
pub struct HttpQueryService {
    base_url: String,
    client: reqwest::Client,
}

/// Response shape of the chatbot endpoints.
///
/// The plan-scoped endpoint answers with `answer` plus `provider_used`,
/// the site-wide endpoint with `response`; accept either.
#[derive(Debug, Deserialize)]
struct QueryReply {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    provider_used: Option<String>,
}

fn build_client(config: &QueryConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| AssistantError::Transport(format!("cannot build HTTP client: {e}")))
}

impl HttpQueryService {
    /// Create a client against the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &QueryConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client: build_client(config)?,
        })
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let url = format!("{}/api/chatbot/query", self.base_url);
        debug!(
            request_id = %request.request_id,
            user_id = request.user_id,
            plan_id = ?request.plan_id,
            "asking assistant backend"
        );

        let body = serde_json::json!({
            "query": request.text,
            "user_id": request.user_id,
            "plan_id": request.plan_id,
            "context": request.context,
        });
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(format!("query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Transport(format!(
                "query returned HTTP {status}"
            )));
        }

        let reply: QueryReply = response
            .json()
            .await
            .map_err(|e| AssistantError::Transport(format!("malformed query response: {e}")))?;

        let answer_text = reply.answer.or(reply.response).unwrap_or_default();
        info!(
            request_id = %request.request_id,
            provider = reply.provider_used.as_deref().unwrap_or("unknown"),
            chars = answer_text.len(),
            "assistant backend answered"
        );

        Ok(QueryResponse {
            answer_text,
            provider_tag: reply.provider_used,
        })
    }
}

/// Conversation-history client for the study-app backend.
pub struct HttpHistoryService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpHistoryService {
    /// Create a client against the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &QueryConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            client: build_client(config)?,
        })
    }
}

#[async_trait]
impl HistoryService for HttpHistoryService {
    async fn clear(&self, user_id: i64, plan_id: i64) -> Result<()> {
        let url = format!("{}/api/chatbot/history/{user_id}/{plan_id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| AssistantError::History(format!("clear request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::History(format!(
                "clear returned HTTP {status}"
            )));
        }
        info!(user_id, plan_id, "server-side conversation history cleared");
        Ok(())
    }
}
