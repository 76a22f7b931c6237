//! # Hearth - Turn-based NPC conversations driven by a language model
//!
//! Hearth is the dialogue layer of a small narrative game: scripted scenes in
//! which the player talks with several NPCs, each voiced by a language model,
//! and each NPC judges the player's answers. Those judgments are aggregated
//! across scenes into a relationship outcome the game branches on.
//!
//! - **Speaking agents**: one transcript per NPC, at most one request in flight
//! - **Reply parsing**: untrusted model text degrades to a usable judgment, never an error
//! - **Turn scheduling**: a single "continue" action arbitrates between text
//!   still printing, pending NPC turns and script steps
//! - **Outcome aggregation**: per-scene records and a gated final majority
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hearth_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = HearthConfig::load()?;
//!     let provider = LLMProviderFactory::create(&config.llm)?;
//!     let campaign = Campaign::from_config(&config.campaign)?;
//!
//!     let registry = OutcomeRegistry::from_config(&config.outcomes).into_shared();
//!     let transition = Arc::new(TimedTransition::new());
//!     let mut playthrough = campaign.new_game(provider, &config, registry, transition);
//!
//!     let (actions_tx, mut actions) = action_channel(16);
//!     // feed PlayerAction::Advance / PlayerAction::Submit from your input loop
//!     # drop(actions_tx);
//!
//!     let mut panel = TextPanel::new();
//!     let reports = playthrough.play(&mut panel, &mut actions).await?;
//!     println!("{} scenes, verdict: {:?}", reports.len(), playthrough.final_verdict());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `llm-openai`: OpenAI-compatible chat completions provider
//! - `llm-ollama`: local Ollama provider

pub mod agent;
pub mod campaign;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod outcome;
pub mod parsing;
pub mod presentation;
pub mod scheduler;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{
        AgentIdentity, AgentReply, Cast, CastMember, ReplyReceiver, ReplySender, SpeakingAgent,
        SpeakingAgentBuilder, reply_channel,
    };
    pub use crate::campaign::{Campaign, Playthrough};
    pub use crate::config::{
        AgentConfig, CampaignConfig, HearthConfig, LLMProvider as LLMProviderType,
        LLMProviderConfig, OutcomeConfig, PresentationConfig,
    };
    pub use crate::conversation::{ConversationLog, LogEntry, Transcript};
    pub use crate::error::{HearthError, Result};
    pub use crate::llm::{
        LLMProvider, LLMProviderFactory, LLMRequest, LLMResponse, Message, MessageRole,
        ScriptedProvider, ScriptedReply,
    };
    pub use crate::outcome::{
        MajorityVerdict, OutcomeCounts, OutcomeRegistry, SceneOutcome, SceneOutcomeRecord,
        SharedOutcomeRegistry,
    };
    pub use crate::parsing::{
        Emotion, JudgmentParser, OutputParser, ParseError, ParseResult, Sentiment, TurnJudgment,
        parse_reply,
    };
    pub use crate::presentation::{
        Color, PanelLine, Presentation, SceneTransition, TextPanel, TimedTransition,
    };
    pub use crate::scheduler::{
        AdvanceOutcome, EvaluationSlot, PlayerAction, SceneReport, SceneRunner, SceneScript,
        SchedulerOptions, ScriptStep, TurnScheduler, TurnStatus, action_channel,
    };
}
