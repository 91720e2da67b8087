use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, models};
use crate::error::AdvisorError;

use super::{ClaudeClient, LlmClient, OllamaClient, OpenAIClient};

/// Supported completion providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAI,
    Claude,
    Ollama,
    Groq,
    OpenRouter,
    LmStudio,
}

impl ProviderId {
    pub fn name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Claude => "Claude (Anthropic)",
            Self::Ollama => "Ollama (Local)",
            Self::Groq => "Groq",
            Self::OpenRouter => "OpenRouter",
            Self::LmStudio => "LM Studio (Local)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "claude" | "anthropic" => Some(Self::Claude),
            "ollama" => Some(Self::Ollama),
            "groq" => Some(Self::Groq),
            "openrouter" => Some(Self::OpenRouter),
            "lmstudio" | "lm_studio" => Some(Self::LmStudio),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Ollama | Self::LmStudio)
    }

    pub fn needs_api_key(&self) -> bool {
        !self.is_local()
    }

    pub fn default_base_url(&self) -> &str {
        match self {
            Self::OpenAI => endpoints::OPENAI_BASE_URL,
            Self::Claude => endpoints::CLAUDE_BASE_URL,
            Self::Ollama => endpoints::OLLAMA_BASE_URL,
            Self::Groq => endpoints::GROQ_BASE_URL,
            Self::OpenRouter => endpoints::OPENROUTER_BASE_URL,
            Self::LmStudio => endpoints::LMSTUDIO_BASE_URL,
        }
    }

    pub fn default_model(&self) -> &str {
        match self {
            Self::OpenAI => models::DEFAULT_OPENAI_MODEL,
            Self::Claude => models::DEFAULT_CLAUDE_MODEL,
            Self::Ollama => models::DEFAULT_OLLAMA_MODEL,
            Self::Groq => models::DEFAULT_GROQ_MODEL,
            Self::OpenRouter => models::DEFAULT_OPENROUTER_MODEL,
            Self::LmStudio => models::DEFAULT_LMSTUDIO_MODEL,
        }
    }

    pub fn default_api_key_env(&self) -> &str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Claude => "ANTHROPIC_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Ollama | Self::LmStudio => "",
        }
    }
}

/// Everything needed to construct a client for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn new(id: ProviderId) -> Self {
        Self {
            base_url: id.default_base_url().to_string(),
            model: id.default_model().to_string(),
            api_key: None,
            id,
        }
    }
}

/// Build an LLM client for the given provider configuration.
pub fn build_client(
    config: &ProviderConfig,
    http: reqwest::Client,
) -> Result<Box<dyn LlmClient>, AdvisorError> {
    let api_key = match (&config.api_key, config.id.needs_api_key()) {
        (Some(key), _) if !key.is_empty() => key.clone(),
        (_, true) => {
            return Err(AdvisorError::Config(format!(
                "An API key is required for {}",
                config.id.name()
            )))
        }
        (_, false) => String::new(),
    };

    let client: Box<dyn LlmClient> = match config.id {
        ProviderId::Claude => Box::new(
            ClaudeClient::new(api_key)
                .with_model(&config.model)
                .with_base_url(&config.base_url)
                .with_http_client(http),
        ),
        ProviderId::Ollama => Box::new(
            OllamaClient::new(&config.model)
                .with_base_url(&config.base_url)
                .with_http_client(http),
        ),
        // Everything else speaks the OpenAI chat-completions dialect
        _ => Box::new(
            OpenAIClient::new(api_key)
                .with_model(&config.model)
                .with_base_url(&config.base_url)
                .with_http_client(http),
        ),
    };

    Ok(client)
}
