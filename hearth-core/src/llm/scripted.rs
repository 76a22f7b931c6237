//! Scripted provider for offline play and deterministic tests
//!
//! Returns predetermined replies in order, records every request it
//! receives, and can simulate latency.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{HearthError, Result};
use crate::llm::{LLMProvider, LLMRequest, LLMResponse, Message, ModelInfo};

/// One predetermined outcome of a provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Reply with this text verbatim
    Text(String),
    /// Reply with empty content
    Empty,
    /// Fail the call with a provider error
    Failure(String),
}

impl ScriptedReply {
    pub fn text(content: impl Into<String>) -> Self {
        ScriptedReply::Text(content.into())
    }

    /// Well-formed judgment JSON, the shape the response format instruction asks for
    pub fn judgment(message: &str, emotion: &str, affinity: &str) -> Self {
        ScriptedReply::Text(
            serde_json::json!({
                "message": message,
                "emotion": emotion,
                "affinity": affinity,
            })
            .to_string(),
        )
    }
}

/// Provider that plays back a queue of replies
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<ScriptedReply>,
    delay: Duration,
    call_count: AtomicUsize,
    call_history: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    /// Create a provider with replies returned in order
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            fallback: None,
            delay: Duration::ZERO,
            call_count: AtomicUsize::new(0),
            call_history: Mutex::new(Vec::new()),
        }
    }

    /// Provider that answers every call with the same reply
    pub fn repeating(reply: ScriptedReply) -> Self {
        Self::new(Vec::new()).with_fallback(reply)
    }

    /// Reply used once the queue is exhausted
    pub fn with_fallback(mut self, reply: ScriptedReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Add a simulated delay to every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue another reply
    pub async fn push(&self, reply: ScriptedReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Transcripts received, in call order
    pub async fn call_history(&self) -> Vec<Vec<Message>> {
        self.call_history.lock().await.clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.call_history.lock().await.push(request.messages.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.replies.lock().await.pop_front();
        let reply = match next.or_else(|| self.fallback.clone()) {
            Some(reply) => reply,
            None => {
                return Err(HearthError::Provider(
                    "scripted provider has no replies left".to_string(),
                ));
            }
        };

        match reply {
            ScriptedReply::Text(content) => Ok(LLMResponse {
                content,
                usage: None,
            }),
            ScriptedReply::Empty => Ok(LLMResponse {
                content: String::new(),
                usage: None,
            }),
            ScriptedReply::Failure(message) => Err(HearthError::Provider(message)),
        }
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "scripted".to_string(),
            model_name: "offline".to_string(),
        }
    }
}
