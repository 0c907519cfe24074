//! OpenRouter provider — reqwest client against an OpenAI-compatible
//! `/chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

use super::provider::{CompletionRequest, CompletionResponse, LlmProvider, ResponseSchema};

/// Configuration for the OpenRouter provider.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OpenRouterConfig {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: model.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI-compatible API provider.
pub struct OpenRouterProvider {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterProvider {
    /// Build the provider. Fails if the HTTP client cannot be
    /// constructed — the request timeout is enforced by this client,
    /// so running without it is not an option.
    pub fn new(config: OpenRouterConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_wire_request(
        &self,
        request: &CompletionRequest,
        response_format: Option<serde_json::Value>,
    ) -> WireRequest {
        WireRequest {
            model: self.config.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format,
        }
    }

    async fn send(&self, wire: &WireRequest) -> Result<WireResponse, LlmError> {
        let response = self
            .client
            .post(self.completions_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .json(wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout)
                } else {
                    LlmError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthFailed,
                429 => LlmError::RateLimited { retry_after: None },
                _ => LlmError::RequestFailed {
                    reason: format!("status {status}: {body}"),
                },
            });
        }

        response.json().await.map_err(|e| LlmError::InvalidResponse {
            reason: format!("failed to parse response body: {e}"),
        })
    }

    fn first_choice(response: WireResponse) -> Result<CompletionResponse, LlmError> {
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                reason: "no choices in response".to_string(),
            })?;

        let usage = response.usage.unwrap_or_default();
        Ok(CompletionResponse {
            content,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let wire = self.to_wire_request(&request, None);
        let response = self.send(&wire).await?;
        Self::first_choice(response)
    }

    async fn complete_structured(
        &self,
        request: CompletionRequest,
        schema: ResponseSchema,
    ) -> Result<serde_json::Value, LlmError> {
        let wire = self.to_wire_request(&request, Some(schema.to_response_format()));
        let response = self.send(&wire).await?;
        let completion = Self::first_choice(response)?;
        serde_json::from_str(completion.content.trim()).map_err(|e| LlmError::InvalidResponse {
            reason: format!("structured output is not valid JSON: {e}"),
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::{ChatMessage, ResponseSchema};

    #[test]
    fn provider_builds_with_timeout() {
        let config = OpenRouterConfig::new(SecretString::from("test-key"), "openai/o4-mini")
            .with_timeout(Duration::from_secs(5));
        assert!(OpenRouterProvider::new(config).is_ok());
    }

    #[test]
    fn wire_request_serializes_expected_shape() {
        let config = OpenRouterConfig::new(SecretString::from("test-key"), "openai/o4-mini");
        let provider = OpenRouterProvider::new(config).unwrap();

        let request = CompletionRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
        ])
        .with_max_tokens(256)
        .with_temperature(0.0);

        let wire = provider.to_wire_request(&request, None);
        let json = serde_json::to_value(&wire).unwrap();

        assert_eq!(json["model"], "openai/o4-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_tokens"], 256);
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn response_format_wraps_schema() {
        let schema = ResponseSchema::new(
            "readiness",
            serde_json::json!({
                "type": "object",
                "properties": {"ready": {"type": "boolean"}},
                "required": ["ready"],
                "additionalProperties": false
            }),
        );
        let format = schema.to_response_format();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "readiness");
        assert_eq!(format["json_schema"]["strict"], true);
    }

    #[test]
    fn parse_wire_response() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "What takes the most time?"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 9}
        }"#;
        let response: WireResponse = serde_json::from_str(body).unwrap();
        let completion = OpenRouterProvider::first_choice(response).unwrap();
        assert_eq!(completion.content, "What takes the most time?");
        assert_eq!(completion.input_tokens, 120);
        assert_eq!(completion.output_tokens, 9);
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let response: WireResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let err = OpenRouterProvider::first_choice(response).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }
}
