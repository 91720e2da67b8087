mod traits;
mod claude;
mod openai;
mod ollama;
pub mod provider;

pub use traits::*;
pub use claude::ClaudeClient;
pub use openai::OpenAIClient;
pub use ollama::OllamaClient;
pub use provider::{build_client, ProviderConfig, ProviderId};
