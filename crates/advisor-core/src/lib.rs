pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod export;
pub mod generator;
pub mod llm;
pub mod orchestrator;
pub mod search;

// Re-export key types
pub use config::Settings;
pub use context::{FileStore, HistoryStore, KeyValueStore, MemoryStore, Speaker, Turn};
pub use error::{AdvisorError, ExportError};
pub use export::{CredentialProvider, DocumentExporter, ExportReceipt, GoogleAuth, GoogleDocsExporter};
pub use generator::{Reply, ResponseGenerator};
pub use llm::{LlmClient, LlmResponse, Message, Role};
pub use orchestrator::{ChatEvent, ChatState, Notice, NoticeLevel, Orchestrator, Phase, SaveOutcome};
pub use search::{GroundingSearch, SearchHit, SearchProvider};
