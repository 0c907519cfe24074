//! Business profile extraction.
//!
//! A single terminal extraction over the full message history. The
//! schema is closed: every field is required, list fields may be empty
//! but never absent, and unknown fields fail the whole extraction.

use std::sync::Arc;

use tracing::debug;

use crate::engine::model::SessionMessage;
use crate::error::{Error, ExtractionError};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider, ResponseSchema};
use crate::proposal::model::BusinessProfile;

const EXTRACTION_SYSTEM_PROMPT: &str = "\
You extract a structured business profile from a discovery interview transcript. \
Use only information the business owner actually stated. Leave list fields empty \
rather than inventing entries; set business_size to null if it was never discussed.";

/// Closed JSON schema for the extracted profile.
fn profile_schema() -> ResponseSchema {
    ResponseSchema {
        name: "business_profile",
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "business_name": { "type": "string" },
                "industry": { "type": "string" },
                "business_size": {
                    "type": ["string", "null"],
                    "description": "small, medium, or large; null if unknown"
                },
                "main_pain_points": { "type": "array", "items": { "type": "string" } },
                "time_wasters": { "type": "array", "items": { "type": "string" } },
                "bottlenecks": { "type": "array", "items": { "type": "string" } },
                "automation_opportunities": { "type": "array", "items": { "type": "string" } },
                "customer_service_challenges": { "type": "array", "items": { "type": "string" } }
            },
            "required": [
                "business_name",
                "industry",
                "business_size",
                "main_pain_points",
                "time_wasters",
                "bottlenecks",
                "automation_opportunities",
                "customer_service_challenges"
            ],
            "additionalProperties": false
        }),
    }
}

/// Extracts a `BusinessProfile` from a completed interview.
pub struct ProfileExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl ProfileExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Run the extraction over the full history.
    ///
    /// Schema violations fail the whole extraction; no partially
    /// populated profile is ever returned.
    pub async fn extract(&self, history: &[SessionMessage]) -> Result<BusinessProfile, Error> {
        let transcript = history
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let request = CompletionRequest::new(vec![
            ChatMessage::system(EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Interview transcript:\n{transcript}\n\nExtract the business profile."
            )),
        ])
        .with_max_tokens(1000)
        .with_temperature(0.0);

        let value = self.llm.complete_structured(request, profile_schema()).await?;
        let profile: BusinessProfile = serde_json::from_value(value)
            .map_err(|e| ExtractionError::SchemaViolation(e.to_string()))?;

        debug!(business_name = %profile.business_name, "Business profile extracted");
        Ok(profile)
    }
}
