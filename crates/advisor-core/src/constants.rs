//! Advisor Chat: centralized constants.
//! Limits, endpoints, storage keys and fixed texts live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";
    pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-5-20250929";
    pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";
    pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
    pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4.1";
    pub const DEFAULT_LMSTUDIO_MODEL: &str = "local-model";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
    pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";
    pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
    pub const LMSTUDIO_BASE_URL: &str = "http://localhost:1234";

    pub const GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
    pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

    pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
    pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
    pub const GOOGLE_DOCS_URL: &str = "https://docs.googleapis.com/v1/documents";
    pub const GOOGLE_DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
    pub const GOOGLE_SCOPES: &[&str] = &[
        "https://www.googleapis.com/auth/documents",
        "https://www.googleapis.com/auth/drive.file",
    ];
    pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/auth/google/callback";
}

// ─── Generation ───────────────────────────────────────────────────────────────

pub mod generation {
    pub const TEMPERATURE: f32 = 0.7;
    pub const MAX_TOKENS: u32 = 1000;
    /// History turns sent along with each completion request.
    pub const CONTEXT_TURNS: usize = 5;
    pub const CONTEXT_PREFIX: &str = "Additional context: ";
}

// ─── Limits ───────────────────────────────────────────────────────────────────

pub mod limits {
    /// Maximum number of persisted conversation turns.
    pub const MAX_HISTORY_TURNS: usize = 10;
    pub const MAX_SEARCH_RESULTS: usize = 5;
    pub const HTTP_TIMEOUT_SECS: u64 = 60;
    pub const SEARCH_TIMEOUT_SECS: u64 = 15;
}

// ─── Storage Keys ─────────────────────────────────────────────────────────────

pub mod keys {
    pub const CHAT_HISTORY: &str = "chat_history";
    pub const GOOGLE_AUTH_TOKEN: &str = "google_auth_token";
    pub const MAIN_DOCUMENT_ID: &str = "main_document_id";
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "advisor";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const DATA_DIR: &str = "advisor";
}

// ─── Fixed Texts ──────────────────────────────────────────────────────────────

pub mod texts {
    pub const ADVISOR_NAME: &str = "Guido";
    pub const GREETING: &str = "Hello! How can I help you today?";
    pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble processing your message. Please try again later.";
    pub const EMPTY_REPLY: &str = "Sorry, I couldn't come up with an answer.";
    pub const SEARCH_FALLBACK: &str = "[grounding unavailable: no search results for this question]";
    pub const MAIN_DOCUMENT_TITLE: &str = "Chat with the Advisor";
    pub const SEND_ERROR: &str = "Error sending message. Please try again.";
}
