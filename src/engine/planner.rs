//! Adaptive question planning.
//!
//! The planner never generates answers locally: the next question is
//! always produced by the model from the rendered transcript. Transport
//! failures propagate — a failed call never degrades into a canned
//! question mid-interview.

use std::sync::Arc;

use tracing::debug;

use crate::engine::context::build_context;
use crate::engine::model::SessionMessage;
use crate::engine::prompts;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Plans the next interview question from the conversation so far.
pub struct QuestionPlanner {
    llm: Arc<dyn LlmProvider>,
    window: usize,
}

impl QuestionPlanner {
    pub fn new(llm: Arc<dyn LlmProvider>, window: usize) -> Self {
        Self { llm, window }
    }

    /// The fixed opening question. No model call is made for it.
    pub fn opening_question(&self) -> &'static str {
        prompts::OPENING_QUESTION
    }

    /// Generate the next question from the recent message history.
    pub async fn next_question(
        &self,
        history: &[SessionMessage],
    ) -> Result<String, LlmError> {
        let context = build_context(history, self.window);
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::PLANNER_SYSTEM_PROMPT),
            ChatMessage::user(prompts::planner_user_content(&context)),
        ])
        .with_max_tokens(300)
        .with_temperature(0.7);

        let response = self.llm.complete(request).await?;
        let question = response.content.trim().to_string();
        if question.is_empty() {
            return Err(LlmError::InvalidResponse {
                reason: "planner returned an empty question".to_string(),
            });
        }

        debug!(history_len = history.len(), "Next question planned");
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::MessageRole;
    use crate::llm::mock::{MockProvider, MockReply};
    use chrono::Utc;
    use uuid::Uuid;

    fn msg(role: MessageRole, content: &str, order: i64) -> SessionMessage {
        SessionMessage {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            message_order: order,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn plans_question_from_transcript() {
        let llm = Arc::new(MockProvider::new(vec![MockReply::Text(
            "  How many employees do you have?  ".to_string(),
        )]));
        let planner = QuestionPlanner::new(llm.clone(), 10);

        let history = vec![
            msg(MessageRole::Assistant, "What's your business name?", 1),
            msg(MessageRole::User, "Acme Cleaning, home services", 2),
        ];
        let question = planner.next_question(&history).await.unwrap();
        assert_eq!(question, "How many employees do you have?");

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let user_content = &requests[0].messages[1].content;
        assert!(user_content.contains("Business Owner: Acme Cleaning, home services"));
    }

    #[tokio::test]
    async fn empty_model_output_is_an_error() {
        let llm = Arc::new(MockProvider::new(vec![MockReply::Text("   ".to_string())]));
        let planner = QuestionPlanner::new(llm, 10);
        let result = planner.next_question(&[]).await;
        assert!(matches!(result, Err(LlmError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let llm = Arc::new(MockProvider::new(vec![MockReply::Fail(
            "connection reset".to_string(),
        )]));
        let planner = QuestionPlanner::new(llm, 10);
        let result = planner.next_question(&[]).await;
        assert!(matches!(result, Err(LlmError::RequestFailed { .. })));
    }
}
