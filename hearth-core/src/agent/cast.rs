//! The set of speaking agents in one scene

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use super::{ReplySender, SpeakingAgent};
use crate::config::HearthConfig;
use crate::error::{HearthError, Result};
use crate::llm::LLMProvider;
use crate::presentation::Color;

/// Cast entry as written in a scene script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: String,

    /// Name on the dialogue panel (defaults to the id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub color: Color,

    /// Role instruction; a generic villager persona is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

impl CastMember {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            color: Color::WHITE,
            persona: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    /// Panel label for this member
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// Agents of one scene, in script order
#[derive(Debug, Default)]
pub struct Cast {
    agents: Vec<SpeakingAgent>,
}

impl Cast {
    /// Wrap already-built agents; ids must be unique
    pub fn new(agents: Vec<SpeakingAgent>) -> Result<Self> {
        let mut seen = HashSet::new();
        for agent in &agents {
            if !seen.insert(agent.id().to_string()) {
                return Err(HearthError::Script(format!(
                    "duplicate cast member '{}'",
                    agent.id()
                )));
            }
        }
        Ok(Self { agents })
    }

    /// Build one agent per script entry, all sharing a provider
    pub fn from_members(
        members: &[CastMember],
        provider: Arc<dyn LLMProvider>,
        config: &HearthConfig,
    ) -> Result<Self> {
        let agents = members
            .iter()
            .map(|member| {
                let mut builder = SpeakingAgent::builder(member.id.as_str())
                    .display_name(member.label())
                    .color(member.color)
                    .llm_provider(Arc::clone(&provider))
                    .agent_config(&config.agent)
                    .llm_config(&config.llm);
                if let Some(persona) = &member.persona {
                    builder = builder.persona(persona.as_str());
                }
                builder.build()
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(agents)
    }

    pub fn get(&self, id: &str) -> Option<&SpeakingAgent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SpeakingAgent> {
        self.agents.iter_mut().find(|a| a.id() == id)
    }

    /// Like [`Cast::get_mut`], for callers that treat a missing agent as an error
    pub fn require_mut(&mut self, id: &str) -> Result<&mut SpeakingAgent> {
        self.get_mut(id)
            .ok_or_else(|| HearthError::AgentNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(|a| a.id())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpeakingAgent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SpeakingAgent> {
        self.agents.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Any member still waiting on the service
    pub fn any_awaiting_reply(&self) -> bool {
        self.agents.iter().any(|a| a.is_awaiting_reply())
    }

    pub fn subscribe_all(&mut self, sender: &ReplySender) {
        for agent in &mut self.agents {
            agent.subscribe(sender.clone());
        }
    }

    pub fn unsubscribe_all(&mut self) {
        for agent in &mut self.agents {
            agent.unsubscribe();
        }
    }

    pub fn set_direct_input_all(&mut self, accepts: bool) {
        for agent in &mut self.agents {
            agent.set_accepts_direct_input(accepts);
        }
    }

    pub fn reset_contexts(&mut self, scene_instruction: Option<&str>) {
        for agent in &mut self.agents {
            agent.reset_context(scene_instruction);
        }
    }

    /// Let every member hear a line
    pub fn hear_all(&mut self, label: &str, text: &str) {
        for agent in &mut self.agents {
            agent.hear(label, text);
        }
    }

    /// Let everyone but `speaker_id` hear a line
    pub fn hear_except(&mut self, speaker_id: &str, label: &str, text: &str) {
        for agent in self.agents.iter_mut().filter(|a| a.id() != speaker_id) {
            agent.hear(label, text);
        }
    }

    /// Let one member hear a line; unknown ids are logged and skipped
    pub fn hear_one(&mut self, listener_id: &str, label: &str, text: &str) {
        match self.get_mut(listener_id) {
            Some(agent) => agent.hear(label, text),
            None => warn!(agent = listener_id, "Unknown listener, line not delivered"),
        }
    }
}
