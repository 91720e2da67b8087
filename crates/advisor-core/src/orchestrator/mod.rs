mod core;
mod state;

pub use self::core::Orchestrator;
pub use self::state::{ChatEvent, ChatState, Notice, NoticeLevel, Phase, SaveOutcome};
