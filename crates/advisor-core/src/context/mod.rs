mod history;
mod builder;
pub mod system_prompt;
pub mod persistence;

pub use history::{HistoryStore, Speaker, Turn};
pub use builder::ContextBuilder;
pub use system_prompt::SystemPromptBuilder;
pub use persistence::{FileStore, KeyValueStore, MemoryStore};
