//! LLM integration for BizScope.
//!
//! All semantic judgment — what to ask next, whether the interview is
//! ready, how to structure the extracted profile — is delegated to an
//! external model behind the [`LlmProvider`] trait. The trait has two
//! variants: free-text completion and schema-constrained completion.
//! The engine's job is to orchestrate those calls, never to interpret
//! language itself.

pub mod mock;
pub mod openrouter;
pub mod provider;

pub use mock::MockProvider;
pub use openrouter::{OpenRouterConfig, OpenRouterProvider};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, ResponseSchema, Role,
};

use std::sync::Arc;

use crate::error::LlmError;

/// Create the production LLM provider from configuration.
pub fn create_provider(config: OpenRouterConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    tracing::info!(model = %config.model, "Using OpenRouter-compatible LLM endpoint");
    Ok(Arc::new(OpenRouterProvider::new(config)?))
}
