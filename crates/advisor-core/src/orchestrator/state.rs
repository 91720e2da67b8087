use crate::context::Turn;

/// Orchestrator lifecycle: `Idle → Sending → (Idle | Error)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Sending,
    Error(String),
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    pub turns: Vec<Turn>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short user-visible message (toast, status line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Events emitted while the orchestrator works, for front-ends that render progress.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Sending,
    TurnAppended(Turn),
    Notice(Notice),
    Error(String),
    Idle,
}

/// Result of `save_to_document`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { document_url: Option<String> },
    /// Not signed in; the authorization flow was started.
    AuthRequired,
    /// The credential was rejected; the authorization flow was restarted.
    SessionExpired,
    NotFound,
    /// No exporter configured.
    Unavailable,
    Failed(String),
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }

    pub fn notice(&self) -> Notice {
        match self {
            SaveOutcome::Saved { document_url: Some(url) } => {
                Notice::info("Saved", format!("Message saved to Google Docs: {url}"))
            }
            SaveOutcome::Saved { document_url: None } => {
                Notice::info("Saved", "Message saved to Google Docs.")
            }
            SaveOutcome::AuthRequired => Notice::info(
                "Authentication required",
                "Sign in with Google to save messages, then try again.",
            ),
            SaveOutcome::SessionExpired => Notice::info(
                "Session expired",
                "Your session has expired. Sign in with Google again.",
            ),
            SaveOutcome::NotFound => Notice::error("Error", "Message not found."),
            SaveOutcome::Unavailable => Notice::error(
                "Unavailable",
                "Document export is not configured.",
            ),
            SaveOutcome::Failed(_) => Notice::error(
                "Error",
                "Could not save to Google Docs. Please try again.",
            ),
        }
    }
}
