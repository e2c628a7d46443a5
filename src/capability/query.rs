//! Remote assistant service ports.

use crate::context::ConversationScope;
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// One outbound question to the assistant backend.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// The user's question.
    pub text: String,
    /// Acting user.
    pub user_id: i64,
    /// Study plan the conversation is bound to, when plan-scoped.
    pub plan_id: Option<i64>,
    /// Page-context hint; empty when no flow is active.
    pub context: String,
    /// Correlation id for request logging.
    pub request_id: Uuid,
}

impl QueryRequest {
    /// Build a request for `text` asked within `scope`.
    pub fn new(text: impl Into<String>, user_id: i64, scope: &ConversationScope) -> Self {
        Self {
            text: text.into(),
            user_id,
            plan_id: scope.plan_id(),
            context: scope.context_hint().to_owned(),
            request_id: Uuid::new_v4(),
        }
    }
}

/// The answer returned by the assistant backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    /// Answer text. May be empty when the backend had nothing to say.
    pub answer_text: String,
    /// Which backend model/service produced the answer, when reported.
    pub provider_tag: Option<String>,
}

/// Remote question-answering service.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Ask one question.
    ///
    /// # Errors
    ///
    /// Any network or server failure surfaces as
    /// [`crate::error::AssistantError::Transport`]; the widget converts it
    /// into a single fallback chat message.
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse>;
}

/// Remote conversation-history persistence.
#[async_trait]
pub trait HistoryService: Send + Sync {
    /// Delete the stored history for `(user_id, plan_id)`.
    ///
    /// # Errors
    ///
    /// Returns an error on network or server failure. The widget treats
    /// this as best-effort: the local transcript resets regardless.
    async fn clear(&self, user_id: i64, plan_id: i64) -> Result<()>;
}
