use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Storage error: {key}: {message}")]
    Storage { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("A message is already being sent")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Orchestration error: {0}")]
    Orchestration(String),
}

impl AdvisorError {
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failures reported by a document-export backend.
///
/// `AuthExpired` is kept apart from the rest because the caller answers it by
/// restarting the authorization flow instead of showing a generic error.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Token expired or permission denied")]
    AuthExpired,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl From<reqwest::Error> for ExportError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
