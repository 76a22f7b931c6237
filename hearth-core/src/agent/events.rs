//! Reply delivery from in-flight requests back to the scene
//!
//! Each provider call runs on its own task. When it completes it sends an
//! [`AgentReply`] over the scene's reply channel; the scene hands the envelope
//! back to the agent that issued it, on the scheduler's logical thread.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Completion of one agent request
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// Agent that issued the request
    pub agent_id: String,
    /// Request this reply answers
    pub request_id: Uuid,
    /// Context epoch the request was issued under
    pub epoch: u64,
    /// Raw reply text; `None` when the provider failed
    pub content: Option<String>,
    /// When the provider call finished
    pub received_at: DateTime<Utc>,
}

impl AgentReply {
    pub fn new(
        agent_id: impl Into<String>,
        request_id: Uuid,
        epoch: u64,
        content: Option<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            request_id,
            epoch,
            content,
            received_at: Utc::now(),
        }
    }

    /// Content that carries at least one non-whitespace character
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Sender half of a reply channel
pub type ReplySender = mpsc::UnboundedSender<AgentReply>;

/// Receiver half of a reply channel
pub type ReplyReceiver = mpsc::UnboundedReceiver<AgentReply>;

/// Creates a new reply channel for one scene.
///
/// Unbounded: the number of outstanding replies is bounded by the cast size,
/// since no agent has more than one request in flight.
pub fn reply_channel() -> (ReplySender, ReplyReceiver) {
    mpsc::unbounded_channel()
}
