//! Configuration types for Hearth

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HearthError, Result};
use crate::presentation::Color;

/// Main configuration for a Hearth playthrough
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HearthConfig {
    /// Text-response service configuration
    pub llm: LLMProviderConfig,

    /// Speaking agent configuration
    pub agent: AgentConfig,

    /// Outcome registry configuration
    pub outcomes: OutcomeConfig,

    /// Presentation timings and player identity
    pub presentation: PresentationConfig,

    /// Scene script location
    pub campaign: CampaignConfig,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Provider type
    pub provider: LLMProvider,

    /// Model name sent with every request
    pub model: String,

    /// API key (if needed, prefer env vars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL (for custom endpoints, e.g., Ollama)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens per reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl LLMProviderConfig {
    /// Configured model name, or `None` to let the provider pick its default
    pub fn model_override(&self) -> Option<String> {
        let model = self.model.trim();
        (!model.is_empty()).then(|| model.to_string())
    }
}

impl Default for LLMProviderConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Ollama,
    /// Canned replies, no network
    Offline,
}

/// Speaking agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Transcript size above which the oldest non-system messages are dropped
    pub max_transcript_messages: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_transcript_messages: 40,
        }
    }
}

/// Outcome registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeConfig {
    /// Scenes that must report before a final majority is exposed
    pub expected_scene_count: usize,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            expected_scene_count: 10,
        }
    }
}

/// Presentation timings and player identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// Dialogue panel fade duration
    #[serde(with = "humantime_serde")]
    pub panel_fade: Duration,

    /// Screen fade to/from black between scenes
    #[serde(with = "humantime_serde")]
    pub screen_fade: Duration,

    /// Label used for player lines
    pub player_name: String,

    /// Name color for player lines
    pub player_color: Color,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            panel_fade: Duration::from_millis(300),
            screen_fade: Duration::from_secs(1),
            player_name: "Player".to_string(),
            player_color: Color::WHITE,
        }
    }
}

/// Scene script location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Directory holding scene scripts (toml, yaml or json)
    pub scene_dir: PathBuf,

    /// Scene played first on a new game
    pub first_scene: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            scene_dir: PathBuf::from("./scenes"),
            first_scene: "Gate".to_string(),
        }
    }
}

impl HearthConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (hearth.toml)
    /// 3. File named by HEARTH_CONFIG_PATH
    /// 4. Environment variable overrides (`HEARTH_LLM__MODEL=...`)
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is invalid or the result fails validation.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(HearthConfig::default()))
            .merge(Toml::file("hearth.toml"));

        if let Ok(path) = std::env::var("HEARTH_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: HearthConfig = figment
            .merge(Env::prefixed("HEARTH_").split("__"))
            .extract()
            .map_err(|e| {
                HearthError::Configuration(format!("Failed to load configuration: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let config: HearthConfig = Figment::from(Serialized::defaults(HearthConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                HearthError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_transcript_messages == 0 {
            return Err(HearthError::Configuration(
                "agent.max_transcript_messages must be at least 1".to_string(),
            ));
        }
        if self.outcomes.expected_scene_count == 0 {
            return Err(HearthError::Configuration(
                "outcomes.expected_scene_count must be at least 1".to_string(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(HearthError::Configuration(
                "llm.model must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
