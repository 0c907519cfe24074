//! Readiness classification.
//!
//! Two-stage gate: a local message-count floor first, then a
//! schema-constrained verdict from the model. The model's answer is a
//! structured boolean, not free text scanned for keywords.

use std::sync::Arc;

use tracing::debug;

use crate::engine::context::build_context;
use crate::engine::model::{MessageRole, SessionMessage};
use crate::engine::prompts;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Decides whether enough information has been gathered to hand off to
/// proposal generation.
pub struct ReadinessClassifier {
    llm: Arc<dyn LlmProvider>,
    min_user_messages: usize,
    window: usize,
}

impl ReadinessClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, min_user_messages: usize, window: usize) -> Self {
        Self {
            llm,
            min_user_messages,
            window,
        }
    }

    /// Classify the session as ready or not.
    ///
    /// Below the user-message floor this returns `false` without making
    /// any external call. Transport errors propagate; a well-formed
    /// verdict missing the boolean counts as not ready.
    pub async fn is_ready(&self, history: &[SessionMessage]) -> Result<bool, LlmError> {
        let user_messages = history
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();
        if user_messages < self.min_user_messages {
            debug!(
                user_messages,
                floor = self.min_user_messages,
                "Below readiness floor, skipping classification"
            );
            return Ok(false);
        }

        let context = build_context(history, self.window);
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::READINESS_SYSTEM_PROMPT),
            ChatMessage::user(prompts::readiness_user_content(&context)),
        ])
        .with_max_tokens(50)
        .with_temperature(0.0);

        let verdict = self
            .llm
            .complete_structured(request, prompts::readiness_schema())
            .await?;
        let ready = verdict
            .get("ready")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        debug!(user_messages, ready, "Readiness classified");
        Ok(ready)
    }
}
