//! Speaking agents
//!
//! A [`SpeakingAgent`] is one NPC's voice: a private transcript, a provider to
//! ask, and at most one request in flight. A context reset orphans the
//! current request's reply but does not cancel the call, so no new request
//! goes out until the old call has finished. Requests run on spawned tasks and
//! their completions come back as [`AgentReply`] envelopes over the reply
//! channel the agent is subscribed to; the owner passes each envelope to
//! [`SpeakingAgent::receive`] to get the parsed [`TurnJudgment`].
//!
//! # Example
//!
//! ```rust,no_run
//! use hearth_core::agent::{SpeakingAgent, reply_channel};
//! use hearth_core::llm::{ScriptedProvider, ScriptedReply};
//! use std::sync::Arc;
//!
//! # async fn demo() -> hearth_core::error::Result<()> {
//! let provider = Arc::new(ScriptedProvider::repeating(ScriptedReply::judgment(
//!     "State your business.",
//!     "neutral",
//!     "unfavorable",
//! )));
//!
//! let mut agent = SpeakingAgent::builder("iris")
//!     .display_name("Iris")
//!     .persona("Act as a wary gatekeeper.")
//!     .llm_provider(provider)
//!     .build()?;
//!
//! let (tx, mut rx) = reply_channel();
//! agent.subscribe(tx);
//! agent.ask("A stranger approaches the gate.");
//!
//! if let Some(reply) = rx.recv().await {
//!     if let Some(judgment) = agent.receive(&reply) {
//!         println!("{}: {}", agent.display_name(), judgment.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cast;
pub mod events;
pub mod prompts;

pub use cast::{Cast, CastMember};
pub use events::{AgentReply, ReplyReceiver, ReplySender, reply_channel};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{AgentConfig, LLMProviderConfig};
use crate::conversation::Transcript;
use crate::error::{HearthError, Result};
use crate::llm::{LLMProvider, LLMRequest, Message};
use crate::parsing::{JudgmentParser, TurnJudgment};
use crate::presentation::Color;

/// Who an agent is on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub id: String,
    pub display_name: String,
    pub color: Color,
}

/// Per-request model settings copied into every request
#[derive(Debug, Clone, Default)]
struct RequestSettings {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

/// One NPC's conversational state
pub struct SpeakingAgent {
    identity: AgentIdentity,
    base_instruction: String,
    provider: Arc<dyn LLMProvider>,
    settings: RequestSettings,
    transcript: Transcript,
    parser: JudgmentParser,
    accepts_direct_input: bool,
    in_flight: Option<Uuid>,
    /// Set while a provider call is running, whatever its epoch
    calling: Arc<AtomicBool>,
    epoch: u64,
    subscriber: Option<ReplySender>,
    favorable: u32,
    unfavorable: u32,
}

impl std::fmt::Debug for SpeakingAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakingAgent")
            .field("identity", &self.identity)
            .field("transcript_len", &self.transcript.len())
            .field("in_flight", &self.in_flight)
            .field("calling", &self.is_calling())
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl SpeakingAgent {
    /// Create a builder for an agent with this id
    pub fn builder(id: impl Into<String>) -> SpeakingAgentBuilder {
        SpeakingAgentBuilder::new().id(id)
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }

    pub fn color(&self) -> Color {
        self.identity.color
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Counter bumped by every context reset
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// A request has been issued and its reply not yet received
    pub fn is_awaiting_reply(&self) -> bool {
        self.in_flight.is_some()
    }

    /// A provider call is still running, possibly for a discarded context
    pub fn is_calling(&self) -> bool {
        self.calling.load(Ordering::Acquire)
    }

    pub fn accepts_direct_input(&self) -> bool {
        self.accepts_direct_input
    }

    pub fn set_accepts_direct_input(&mut self, accepts: bool) {
        self.accepts_direct_input = accepts;
    }

    /// Route future replies to this channel
    pub fn subscribe(&mut self, sender: ReplySender) {
        self.subscriber = Some(sender);
    }

    pub fn unsubscribe(&mut self) {
        self.subscriber = None;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscriber.is_some()
    }

    /// Favorable minus unfavorable judgments received so far
    pub fn affinity_total(&self) -> i64 {
        i64::from(self.favorable) - i64::from(self.unfavorable)
    }

    /// Append `text` as a user line and request a reply
    ///
    /// Returns `false` without touching the transcript when the text is blank,
    /// a request is already in flight (including one orphaned by
    /// [`SpeakingAgent::reset_context`]), or nobody is subscribed to replies.
    pub fn ask(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        if let Some(pending) = self.in_flight {
            warn!(
                agent = %self.identity.id,
                pending = %pending,
                "Request already in flight, dropping ask"
            );
            return false;
        }

        if self.is_calling() {
            warn!(
                agent = %self.identity.id,
                "Previous context's request still running, dropping ask"
            );
            return false;
        }

        let Some(sender) = self.subscriber.clone() else {
            warn!(agent = %self.identity.id, "No reply subscriber, dropping ask");
            return false;
        };

        self.transcript.push_user(text);
        self.transcript.trim();

        let request_id = Uuid::new_v4();
        self.in_flight = Some(request_id);
        self.calling.store(true, Ordering::Release);
        let calling = Arc::clone(&self.calling);

        let request = self.build_request();
        let provider = Arc::clone(&self.provider);
        let agent_id = self.identity.id.clone();
        let epoch = self.epoch;

        debug!(
            agent = %agent_id,
            request = %request_id,
            messages = request.messages.len(),
            "Dispatching request"
        );

        tokio::spawn(async move {
            let content = match provider.generate_request(&request).await {
                Ok(response) => Some(response.content),
                Err(e) => {
                    warn!(agent = %agent_id, error = %e, "Provider call failed");
                    None
                }
            };
            calling.store(false, Ordering::Release);

            if sender
                .send(AgentReply::new(agent_id, request_id, epoch, content))
                .is_err()
            {
                debug!(request = %request_id, "Reply channel closed, discarding reply");
            }
        });

        true
    }

    /// Free-chat entry point, honored only while direct input is accepted
    pub fn submit_direct(&mut self, text: &str) -> bool {
        if !self.accepts_direct_input {
            debug!(agent = %self.identity.id, "Direct input disabled, ignoring");
            return false;
        }
        self.ask(text)
    }

    /// Take a completed request back and parse it
    ///
    /// Replies for another agent, an earlier context epoch, or a request that
    /// is no longer outstanding are discarded.
    pub fn receive(&mut self, reply: &AgentReply) -> Option<TurnJudgment> {
        if reply.agent_id != self.identity.id {
            return None;
        }
        if reply.epoch != self.epoch {
            debug!(
                agent = %self.identity.id,
                reply_epoch = reply.epoch,
                epoch = self.epoch,
                "Discarding reply from an earlier context"
            );
            return None;
        }
        if self.in_flight != Some(reply.request_id) {
            debug!(agent = %self.identity.id, request = %reply.request_id, "Discarding unexpected reply");
            return None;
        }
        self.in_flight = None;

        let raw = match reply.text() {
            Some(text) => text.to_string(),
            None => {
                warn!(agent = %self.identity.id, "Empty reply, using placeholder");
                prompts::PLACEHOLDER_REPLY.to_string()
            }
        };

        self.transcript.push_assistant(raw.as_str());
        self.transcript.trim();

        let judgment = self.parser.parse_reply(&raw);
        if judgment.sentiment.is_favorable() {
            self.favorable += 1;
        } else {
            self.unfavorable += 1;
        }
        Some(judgment)
    }

    /// Append another speaker's line as context, without a request
    pub fn hear(&mut self, speaker_label: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let label = speaker_label.trim();
        let label = if label.is_empty() { "Unknown" } else { label };

        self.transcript.push_user(format!("{}: {}", label, text));
        self.transcript.trim();
    }

    /// Clear the transcript and re-seed the instructions
    ///
    /// Any request still in flight belongs to the old context; its reply
    /// will be discarded, and asks are refused until that call finishes.
    pub fn reset_context(&mut self, scene_instruction: Option<&str>) {
        self.transcript
            .reseed([Some(self.base_instruction.as_str()), scene_instruction].into_iter().flatten());
        self.epoch += 1;
        self.in_flight = None;
        debug!(agent = %self.identity.id, epoch = self.epoch, "Context reset");
    }

    fn build_request(&self) -> LLMRequest {
        let mut request = LLMRequest::from_messages(self.transcript.messages().to_vec());
        if let Some(model) = &self.settings.model {
            request = request.with_model(model.clone());
        }
        if let Some(temperature) = self.settings.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

/// Builder for [`SpeakingAgent`]
pub struct SpeakingAgentBuilder {
    id: Option<String>,
    display_name: Option<String>,
    color: Color,
    persona: Option<String>,
    provider: Option<Arc<dyn LLMProvider>>,
    max_transcript_messages: usize,
    settings: RequestSettings,
    accepts_direct_input: bool,
}

impl SpeakingAgentBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            display_name: None,
            color: Color::WHITE,
            persona: None,
            provider: None,
            max_transcript_messages: AgentConfig::default().max_transcript_messages,
            settings: RequestSettings::default(),
            accepts_direct_input: true,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Name shown on the dialogue panel (defaults to the id)
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Persona instruction; the response format is appended automatically
    pub fn persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn llm_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn max_transcript_messages(mut self, max: usize) -> Self {
        self.max_transcript_messages = max;
        self
    }

    pub fn agent_config(self, config: &AgentConfig) -> Self {
        self.max_transcript_messages(config.max_transcript_messages)
    }

    /// Copy model, temperature and token limit from provider configuration
    pub fn llm_config(mut self, config: &LLMProviderConfig) -> Self {
        let model = config.model.trim();
        self.settings = RequestSettings {
            model: (!model.is_empty()).then(|| model.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.settings.model = Some(model.into());
        self
    }

    pub fn accepts_direct_input(mut self, accepts: bool) -> Self {
        self.accepts_direct_input = accepts;
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<SpeakingAgent> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| HearthError::Configuration("Agent ID is required".to_string()))?;

        let provider = self.provider.ok_or_else(|| {
            HearthError::Configuration(format!("Agent '{}' has no LLM provider", id))
        })?;

        let display_name = self
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| id.clone());

        let base_instruction = prompts::base_instruction(self.persona.as_deref());
        let mut transcript = Transcript::new(self.max_transcript_messages);
        transcript.push(Message::system(base_instruction.as_str()));

        Ok(SpeakingAgent {
            identity: AgentIdentity {
                id,
                display_name,
                color: self.color,
            },
            base_instruction,
            provider,
            settings: self.settings,
            transcript,
            parser: JudgmentParser::new(),
            accepts_direct_input: self.accepts_direct_input,
            in_flight: None,
            calling: Arc::new(AtomicBool::new(false)),
            epoch: 0,
            subscriber: None,
            favorable: 0,
            unfavorable: 0,
        })
    }
}

impl Default for SpeakingAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
