pub mod format;

use crate::constants::{generation, texts};
use crate::context::{ContextBuilder, SystemPromptBuilder, Turn};
use crate::llm::{CompletionRequest, LlmClient};

/// Outcome of one generation attempt. Both variants carry displayable text;
/// `Fallback` marks text that did not come from the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Generated(String),
    Fallback(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Generated(t) | Reply::Fallback(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Generated(t) | Reply::Fallback(t) => t,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Reply::Fallback(_))
    }
}

/// Turns a user question plus grounding and recent history into a formatted
/// advisor reply. `generate` never fails; errors become [`Reply::Fallback`].
pub struct ResponseGenerator {
    llm: Box<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    history_limit: usize,
    system_prompt: String,
}

impl ResponseGenerator {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self {
            model: llm.default_model().to_string(),
            llm,
            temperature: generation::TEMPERATURE,
            max_tokens: generation::MAX_TOKENS,
            history_limit: generation::CONTEXT_TURNS,
            system_prompt: SystemPromptBuilder::new().build(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(
        &self,
        user_text: &str,
        grounding: &str,
        recent_history: &[Turn],
    ) -> CompletionRequest {
        let messages = ContextBuilder::new(self.system_prompt.clone())
            .with_history(recent_history)
            .with_history_limit(self.history_limit)
            .with_grounding(grounding)
            .with_user_query(user_text)
            .build();

        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub async fn generate(&self, user_text: &str, grounding: &str, recent_history: &[Turn]) -> Reply {
        let request = self.build_request(user_text, grounding, recent_history);

        match self.llm.complete(&request).await {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    tracing::debug!(
                        model = %self.model,
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "Completion received"
                    );
                }

                let text = format::normalize(&response.content);
                if text.is_empty() {
                    tracing::warn!(model = %self.model, "Completion was empty");
                    Reply::Fallback(texts::EMPTY_REPLY.to_string())
                } else {
                    Reply::Generated(text)
                }
            }
            Err(e) => {
                tracing::error!(model = %self.model, "Failed to generate response: {e}");
                Reply::Fallback(texts::FALLBACK_REPLY.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Speaker;
    use crate::error::AdvisorError;
    use crate::llm::{LlmResponse, Role};
    use std::sync::{Arc, Mutex};

    struct RecordingLlm {
        reply: Result<String, String>,
        seen: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingLlm {
        async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, AdvisorError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    usage: None,
                }),
                Err(e) => Err(AdvisorError::Llm(e.clone())),
            }
        }

        fn default_model(&self) -> &str {
            "mock-model"
        }
    }

    fn generator(reply: Result<&str, &str>) -> (ResponseGenerator, Arc<Mutex<Vec<CompletionRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let llm = RecordingLlm {
            reply: reply.map(String::from).map_err(String::from),
            seen: seen.clone(),
        };
        (ResponseGenerator::new(Box::new(llm)), seen)
    }

    fn turns(n: u64) -> Vec<Turn> {
        (1..=n)
            .map(|i| Turn {
                id: i,
                speaker: if i % 2 == 1 { Speaker::User } else { Speaker::Advisor },
                text: format!("turn {i}"),
                created_at: "09:00".into(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_generate_normalizes_output() {
        let (gen, _) = generator(Ok("**Short answer.** Longer answer."));
        let reply = gen.generate("q", "", &[]).await;
        assert!(!reply.is_fallback());
        assert_eq!(reply.text(), "Short answer.\n\nLonger answer.");
    }

    #[tokio::test]
    async fn test_generate_failure_returns_fallback() {
        let (gen, seen) = generator(Err("401 unauthorized"));
        let reply = gen.generate("q", "ctx", &turns(2)).await;
        assert_eq!(reply, Reply::Fallback(texts::FALLBACK_REPLY.to_string()));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_completion_is_fallback() {
        let (gen, _) = generator(Ok("   \n"));
        let reply = gen.generate("q", "", &[]).await;
        assert!(reply.is_fallback());
        assert_eq!(reply.text(), texts::EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_request_uses_fixed_sampling_and_last_five_turns() {
        let (gen, seen) = generator(Ok("ok"));
        gen.generate("What is loss aversion?", "Loss aversion\nA bias.", &turns(9)).await;

        let requests = seen.lock().unwrap();
        let req = &requests[0];
        assert_eq!(req.model, "mock-model");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 1000);

        // system + 5 turns + context + question
        assert_eq!(req.messages.len(), 8);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[1].content, "turn 5");
        assert_eq!(req.messages[1].role, Role::User);
        assert_eq!(req.messages[2].role, Role::Assistant);
        assert_eq!(req.messages[5].content, "turn 9");
        assert_eq!(req.messages[6].content, "Additional context: Loss aversion\nA bias.");
        assert_eq!(req.messages[7].content, "What is loss aversion?");
    }
}
