use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{generation, limits, paths, texts};
use crate::context::{HistoryStore, KeyValueStore, SystemPromptBuilder};
use crate::error::{AdvisorError, Result};
use crate::export::{GoogleAuth, GoogleAuthConfig};
use crate::generator::ResponseGenerator;
use crate::llm::{build_client, LlmClient, ProviderConfig, ProviderId};
use crate::search::{DuckDuckGoProvider, GoogleSearchProvider, GroundingSearch};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub google: GoogleSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub persona: PersonaSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: ProviderId,
    /// Empty means the provider's default model.
    pub model: String,
    /// Empty means the provider's conventional variable (e.g. `OPENAI_API_KEY`).
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderId::OpenAI,
            model: String::new(),
            api_key_env: String::new(),
            base_url: None,
            temperature: generation::TEMPERATURE,
            max_tokens: generation::MAX_TOKENS,
            timeout_secs: limits::HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    Google,
    DuckDuckGo,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    pub provider: SearchBackend,
    pub api_key_env: String,
    pub engine_id_env: String,
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: SearchBackend::DuckDuckGo, // works without keys
            api_key_env: "GOOGLE_SEARCH_API_KEY".to_string(),
            engine_id_env: "GOOGLE_SEARCH_ENGINE_ID".to_string(),
            max_results: limits::MAX_SEARCH_RESULTS,
            timeout_secs: limits::SEARCH_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoogleSettings {
    pub client_id_env: String,
    pub client_secret_env: String,
    pub redirect_uri: Option<String>,
    pub document_title: String,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id_env: "GOOGLE_CLIENT_ID".to_string(),
            client_secret_env: "GOOGLE_CLIENT_SECRET".to_string(),
            redirect_uri: None,
            document_title: texts::MAIN_DOCUMENT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistorySettings {
    pub max_turns: usize,
    pub context_turns: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_turns: limits::MAX_HISTORY_TURNS,
            context_turns: generation::CONTEXT_TURNS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersonaSettings {
    pub name: String,
    pub greeting: String,
    /// Replaces the built-in persona directive when set.
    pub prompt: Option<String>,
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            name: texts::ADVISOR_NAME.to_string(),
            greeting: texts::GREETING.to_string(),
            prompt: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %config_path.display(), "Ignoring invalid config: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AdvisorError::Config(e.to_string()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AdvisorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the API key from the environment variable specified in settings.
    pub fn api_key(&self) -> Option<String> {
        let var = if self.llm.api_key_env.is_empty() {
            self.llm.provider.default_api_key_env()
        } else {
            self.llm.api_key_env.as_str()
        };
        env_value(var)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::new(self.llm.provider.clone());
        config.api_key = self.api_key();
        if let Some(url) = self.llm.base_url.as_ref().filter(|u| !u.trim().is_empty()) {
            config.base_url = url.clone();
        }
        if !self.llm.model.trim().is_empty() {
            config.model = self.llm.model.clone();
        }
        config
    }

    pub fn build_llm_client(&self) -> Result<Box<dyn LlmClient>> {
        let http = http_client(self.llm.timeout_secs)?;
        build_client(&self.provider_config(), http)
    }

    pub fn build_generator(&self) -> Result<ResponseGenerator> {
        let mut prompt = SystemPromptBuilder::new().with_advisor_name(&self.persona.name);
        if let Some(persona) = &self.persona.prompt {
            prompt = prompt.with_persona(persona);
        }
        let prompt = prompt.load_user_instructions().build();

        Ok(ResponseGenerator::new(self.build_llm_client()?)
            .with_temperature(self.llm.temperature)
            .with_max_tokens(self.llm.max_tokens)
            .with_history_limit(self.history.context_turns)
            .with_system_prompt(prompt))
    }

    pub fn build_search(&self) -> Result<GroundingSearch> {
        let http = http_client(self.search.timeout_secs)?;
        let search = match self.search.provider {
            SearchBackend::None => return Ok(GroundingSearch::disabled()),
            SearchBackend::DuckDuckGo => {
                GroundingSearch::new(Box::new(DuckDuckGoProvider::new().with_http_client(http)))
            }
            SearchBackend::Google => {
                let key = env_value(&self.search.api_key_env).ok_or_else(|| {
                    AdvisorError::Config(format!("{} is not set", self.search.api_key_env))
                })?;
                let cx = env_value(&self.search.engine_id_env).ok_or_else(|| {
                    AdvisorError::Config(format!("{} is not set", self.search.engine_id_env))
                })?;
                GroundingSearch::new(Box::new(
                    GoogleSearchProvider::new(key, cx).with_http_client(http),
                ))
            }
        };
        Ok(search.with_max_results(self.search.max_results))
    }

    pub fn build_history(&self, store: Arc<dyn KeyValueStore>) -> HistoryStore {
        HistoryStore::new(store).with_max_turns(self.history.max_turns)
    }

    /// `None` when no OAuth client is configured; export is then unavailable.
    pub fn build_google_auth(&self, store: Arc<dyn KeyValueStore>) -> Option<GoogleAuth> {
        let client_id = env_value(&self.google.client_id_env)?;
        let secret = env_value(&self.google.client_secret_env).unwrap_or_default();

        let mut config = GoogleAuthConfig::new(client_id, secret);
        if let Some(uri) = &self.google.redirect_uri {
            config = config.with_redirect_uri(uri);
        }
        Some(GoogleAuth::new(config, store))
    }
}

fn env_value(var: &str) -> Option<String> {
    if var.is_empty() {
        return None;
    }
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryStore;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.llm.provider, ProviderId::OpenAI);
        assert_eq!(s.llm.max_tokens, 1000);
        assert!((s.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(s.history.max_turns, 10);
        assert_eq!(s.history.context_turns, 5);
        assert_eq!(s.search.provider, SearchBackend::DuckDuckGo);
        assert_eq!(s.persona.name, "Guido");
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut s = Settings::default();
        s.llm.provider = ProviderId::Ollama;
        s.llm.model = "llama3.2:3b".into();
        s.search.provider = SearchBackend::None;
        s.persona.prompt = Some("You are a terse advisor.".into());
        s.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), s);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let s: Settings = toml::from_str(
            r#"
            [llm]
            provider = "claude"

            [search]
            provider = "google"
            "#,
        )
        .unwrap();
        assert_eq!(s.llm.provider, ProviderId::Claude);
        assert_eq!(s.llm.max_tokens, 1000);
        assert_eq!(s.search.provider, SearchBackend::Google);
        assert_eq!(s.search.api_key_env, "GOOGLE_SEARCH_API_KEY");
        assert_eq!(s.history.max_turns, 10);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nprovider = \"nonsense\"\n").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(AdvisorError::Config(_))));
    }

    #[test]
    fn test_provider_config_uses_named_env_var() {
        std::env::set_var("ADVISOR_TEST_LLM_KEY", "sk-test");
        let mut s = Settings::default();
        s.llm.api_key_env = "ADVISOR_TEST_LLM_KEY".into();
        s.llm.model = "gpt-4.1-mini".into();
        s.llm.base_url = Some("http://localhost:9999".into());

        let config = s.provider_config();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-4.1-mini");
        assert_eq!(config.base_url, "http://localhost:9999");
        std::env::remove_var("ADVISOR_TEST_LLM_KEY");
    }

    #[test]
    fn test_search_backends() {
        let mut s = Settings::default();
        s.search.provider = SearchBackend::None;
        assert!(!s.build_search().unwrap().is_enabled());

        s.search.provider = SearchBackend::DuckDuckGo;
        assert!(s.build_search().unwrap().is_enabled());

        s.search.provider = SearchBackend::Google;
        s.search.api_key_env = "ADVISOR_TEST_MISSING_SEARCH_KEY".into();
        assert!(matches!(s.build_search(), Err(AdvisorError::Config(_))));
    }

    #[test]
    fn test_google_auth_requires_client_id() {
        let mut s = Settings::default();
        s.google.client_id_env = "ADVISOR_TEST_MISSING_CLIENT_ID".into();
        assert!(s.build_google_auth(Arc::new(MemoryStore::new())).is_none());

        std::env::set_var("ADVISOR_TEST_CLIENT_ID", "client-abc");
        s.google.client_id_env = "ADVISOR_TEST_CLIENT_ID".into();
        let auth = s.build_google_auth(Arc::new(MemoryStore::new())).unwrap();
        assert!(auth.authorization_url().contains("client_id=client-abc"));
        std::env::remove_var("ADVISOR_TEST_CLIENT_ID");
    }

    #[test]
    fn test_history_uses_configured_bound() {
        let mut s = Settings::default();
        s.history.max_turns = 4;
        assert_eq!(s.build_history(Arc::new(MemoryStore::new())).max_turns(), 4);
    }
}
