use crate::constants::{endpoints, models};
use crate::error::AdvisorError;
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};

/// Client for a local Ollama server (`/api/chat`, non-streaming).
pub struct OllamaClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            base_url: endpoints::OLLAMA_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(models::DEFAULT_OLLAMA_MODEL)
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, AdvisorError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model: &request.model,
            messages: &request.messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdvisorError::Llm(format!("Ollama chat error: {e}")))?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            return Err(AdvisorError::Llm(format!(
                "Ollama error ({}): {}",
                status, response_text
            )));
        }

        let parsed: OllamaChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| AdvisorError::Llm(format!("Failed to parse response: {e}")))?;

        let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
            (Some(input), Some(output)) => Some(Usage {
                input_tokens: input,
                output_tokens: output,
            }),
            _ => None,
        };

        Ok(LlmResponse {
            content: parsed.message.map(|m| m.content).unwrap_or_default(),
            usage,
        })
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
