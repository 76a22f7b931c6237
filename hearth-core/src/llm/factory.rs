//! Factory for creating LLM providers from configuration

use crate::agent::prompts::PLACEHOLDER_REPLY;
use crate::config::{LLMProvider as LLMProviderType, LLMProviderConfig};
use crate::error::Result;
use crate::llm::scripted::{ScriptedProvider, ScriptedReply};
use crate::llm::LLMProvider;
use std::sync::Arc;

#[cfg(feature = "llm-ollama")]
use crate::llm::providers::ollama::OllamaProvider;

#[cfg(feature = "llm-openai")]
use crate::llm::providers::openai::OpenAIProvider;

/// Reply every cast member gives in offline mode
pub const OFFLINE_REPLY: &str = PLACEHOLDER_REPLY;

/// Factory for creating LLM providers
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be created (e.g., missing API key
    /// or the provider's cargo feature is disabled)
    pub fn create(config: &LLMProviderConfig) -> Result<Arc<dyn LLMProvider>> {
        match config.provider {
            #[cfg(feature = "llm-openai")]
            LLMProviderType::OpenAI => {
                let model = config.model_override();
                let provider = if let Some(api_key) = &config.api_key {
                    let model_str = model
                        .or_else(|| std::env::var("OPENAI_MODEL").ok())
                        .unwrap_or_else(|| {
                            crate::llm::providers::openai::DEFAULT_OPENAI_MODEL.to_string()
                        });

                    if let Some(base_url) = &config.base_url {
                        OpenAIProvider::with_base_url(api_key.clone(), model_str, base_url.clone())
                    } else {
                        OpenAIProvider::new(api_key.clone(), model_str)
                    }
                } else {
                    OpenAIProvider::from_env(model)?
                };

                Ok(Arc::new(provider))
            }

            #[cfg(not(feature = "llm-openai"))]
            LLMProviderType::OpenAI => Err(crate::error::HearthError::Configuration(
                "OpenAI provider requires 'llm-openai' feature".to_string(),
            )),

            #[cfg(feature = "llm-ollama")]
            LLMProviderType::Ollama => {
                let model = config.model_override();
                let provider = if let Some(url) = config.base_url.clone() {
                    OllamaProvider::new(model.unwrap_or_else(|| "qwen3:14b".to_string()), Some(url))
                } else {
                    OllamaProvider::from_env(model)?
                };

                Ok(Arc::new(provider))
            }

            #[cfg(not(feature = "llm-ollama"))]
            LLMProviderType::Ollama => Err(crate::error::HearthError::Configuration(
                "Ollama provider requires 'llm-ollama' feature".to_string(),
            )),

            LLMProviderType::Offline => Ok(Arc::new(ScriptedProvider::repeating(
                ScriptedReply::text(OFFLINE_REPLY),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMRequest;

    #[tokio::test]
    async fn test_offline_provider() {
        let config = LLMProviderConfig {
            provider: LLMProviderType::Offline,
            ..Default::default()
        };

        let provider = LLMProviderFactory::create(&config).unwrap();
        assert_eq!(provider.model_info().provider, "scripted");

        let response = provider
            .generate_request(&LLMRequest::from_prompt("anyone there?"))
            .await
            .unwrap();
        assert_eq!(response.content, OFFLINE_REPLY);
    }

    #[cfg(feature = "llm-openai")]
    #[test]
    fn test_openai_with_explicit_key() {
        let config = LLMProviderConfig {
            provider: LLMProviderType::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };

        let provider = LLMProviderFactory::create(&config).unwrap();
        assert_eq!(provider.model_info().model_name, "gpt-4o-mini");
    }

    #[cfg(not(feature = "llm-ollama"))]
    #[test]
    fn test_disabled_provider_is_a_configuration_error() {
        let config = LLMProviderConfig {
            provider: LLMProviderType::Ollama,
            ..Default::default()
        };

        let err = LLMProviderFactory::create(&config).err().expect("feature disabled");
        assert!(matches!(err, crate::error::HearthError::Configuration(_)));
    }
}
