//! Scripted mock provider for tests — no network calls.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::LlmError;

use super::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ResponseSchema,
};

/// A scripted reply the mock returns for its next call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Plain text for `complete`; for `complete_structured` the text is
    /// parsed as JSON.
    Text(String),
    /// A JSON value for `complete_structured`; for `complete` it is
    /// serialized to text.
    Json(serde_json::Value),
    /// A transport failure.
    Fail(String),
}

/// Mock [`LlmProvider`] that returns scripted replies in order and
/// counts calls, so tests can assert that a gated path made no call.
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Total number of calls made (both variants).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("mock requests poisoned").clone()
    }

    fn next_reply(&self, request: &CompletionRequest) -> Result<MockReply, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("mock requests poisoned")
            .push(request.clone());
        let reply = self
            .replies
            .lock()
            .expect("mock replies poisoned")
            .pop_front()
            .ok_or_else(|| LlmError::RequestFailed {
                reason: "mock: no scripted reply left".to_string(),
            })?;
        match reply {
            MockReply::Fail(reason) => Err(LlmError::RequestFailed { reason }),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let content = match self.next_reply(&request)? {
            MockReply::Text(text) => text,
            MockReply::Json(value) => value.to_string(),
            MockReply::Fail(_) => unreachable!("Fail is returned as Err"),
        };
        Ok(CompletionResponse {
            content,
            input_tokens: 0,
            output_tokens: 0,
        })
    }

    async fn complete_structured(
        &self,
        request: CompletionRequest,
        _schema: ResponseSchema,
    ) -> Result<serde_json::Value, LlmError> {
        match self.next_reply(&request)? {
            MockReply::Json(value) => Ok(value),
            MockReply::Text(text) => {
                serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                    reason: format!("structured output is not valid JSON: {e}"),
                })
            }
            MockReply::Fail(_) => unreachable!("Fail is returned as Err"),
        }
    }
}
