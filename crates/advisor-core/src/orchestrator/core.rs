use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::UnboundedSender;

use super::state::{ChatEvent, ChatState, Notice, Phase, SaveOutcome};
use crate::constants::texts;
use crate::context::{HistoryStore, Speaker, Turn};
use crate::error::{AdvisorError, ExportError, Result};
use crate::export::{CredentialProvider, DocumentExporter};
use crate::generator::ResponseGenerator;
use crate::search::GroundingSearch;

struct DocumentExport {
    exporter: Arc<dyn DocumentExporter>,
    credentials: Arc<dyn CredentialProvider>,
}

/// Coordinates one conversation: intake, grounding, generation, history.
///
/// Only one `send_message` runs at a time; a second call while one is in
/// flight is rejected with [`AdvisorError::Busy`].
pub struct Orchestrator {
    history: Arc<HistoryStore>,
    search: GroundingSearch,
    generator: ResponseGenerator,
    documents: Option<DocumentExport>,
    phase: Mutex<Phase>,
    events: Option<UnboundedSender<ChatEvent>>,
}

impl Orchestrator {
    pub fn new(history: Arc<HistoryStore>, search: GroundingSearch, generator: ResponseGenerator) -> Self {
        Self {
            history,
            search,
            generator,
            documents: None,
            phase: Mutex::new(Phase::Idle),
            events: None,
        }
    }

    pub fn with_documents(
        mut self,
        exporter: Arc<dyn DocumentExporter>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        self.documents = Some(DocumentExport { exporter, credentials });
        self
    }

    pub fn with_events(mut self, tx: UnboundedSender<ChatEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn phase(&self) -> Phase {
        self.force_phase().clone()
    }

    pub fn state(&self) -> ChatState {
        let phase = self.phase();
        ChatState {
            turns: self.history.get_history(),
            is_loading: phase == Phase::Sending,
            error: match phase {
                Phase::Error(msg) => Some(msg),
                _ => None,
            },
        }
    }

    /// Append the user turn, ground, generate, append the advisor turn.
    /// Returns the advisor turn, which may carry the fallback text.
    ///
    /// Dropping the returned future mid-flight releases the busy guard and
    /// answers the pending user turn with the fallback reply.
    pub async fn send_message(&self, text: &str) -> Result<Turn> {
        if text.trim().is_empty() {
            return Err(AdvisorError::EmptyMessage);
        }

        let mut guard = self.begin_send()?;
        self.emit(ChatEvent::Sending);

        match self.run_turn(text, &mut guard).await {
            Ok(turn) => {
                guard.finish(Phase::Idle);
                self.emit(ChatEvent::Idle);
                Ok(turn)
            }
            Err(e) => {
                tracing::error!("Send failed: {e}");
                guard.finish(Phase::Error(texts::SEND_ERROR.to_string()));
                self.emit(ChatEvent::Error(texts::SEND_ERROR.to_string()));
                Err(e)
            }
        }
    }

    async fn run_turn(&self, text: &str, guard: &mut SendGuard<'_>) -> Result<Turn> {
        // Context is taken before the new user turn so it is not sent twice
        let recent = self.history.recent(self.history.max_turns());

        let user_turn = self.history.new_turn(Speaker::User, text);
        self.history.append(user_turn.clone());
        guard.pending_user_turn = Some(user_turn.id);
        self.emit(ChatEvent::TurnAppended(user_turn.clone()));

        let grounding = self.search.lookup(text).await;
        let reply = self.generator.generate(text, &grounding, &recent).await;
        if reply.is_fallback() {
            tracing::warn!("Appending fallback reply");
        }

        self.ensure_sending()?;
        // A clear during generation dropped the question; the reply would be orphaned
        if self.history.find(user_turn.id).is_none() {
            guard.pending_user_turn = None;
            return Err(AdvisorError::Orchestration(
                "history was cleared while a reply was pending".to_string(),
            ));
        }

        let advisor_turn = self.history.new_turn(Speaker::Advisor, reply.into_text());
        self.history.append(advisor_turn.clone());
        guard.pending_user_turn = None;
        self.emit(ChatEvent::TurnAppended(advisor_turn.clone()));

        Ok(advisor_turn)
    }

    /// Export one turn to the configured document.
    pub async fn save_to_document(&self, turn_id: u64) -> SaveOutcome {
        let outcome = self.export_turn(turn_id).await;
        match &outcome {
            SaveOutcome::Failed(reason) => tracing::warn!(turn_id, "Export failed: {reason}"),
            other => tracing::debug!(turn_id, outcome = ?other, "Export finished"),
        }
        self.emit(ChatEvent::Notice(outcome.notice()));
        outcome
    }

    async fn export_turn(&self, turn_id: u64) -> SaveOutcome {
        let Some(docs) = &self.documents else {
            return SaveOutcome::Unavailable;
        };

        if !docs.credentials.is_authenticated() {
            docs.credentials.initiate_auth();
            return SaveOutcome::AuthRequired;
        }

        let Some(turn) = self.history.find(turn_id) else {
            return SaveOutcome::NotFound;
        };

        self.emit(ChatEvent::Notice(Notice::info("Saving...", "Saving message to Google Docs")));

        match docs.exporter.save(&turn.text).await {
            Ok(receipt) => SaveOutcome::Saved {
                document_url: receipt.document_url,
            },
            Err(ExportError::AuthExpired) => {
                docs.credentials.initiate_auth();
                SaveOutcome::SessionExpired
            }
            Err(ExportError::NotAuthenticated) => {
                docs.credentials.initiate_auth();
                SaveOutcome::AuthRequired
            }
            Err(e) => SaveOutcome::Failed(e.to_string()),
        }
    }

    /// Drop every turn. A send in flight keeps its `Sending` phase and ends
    /// in `Error` without appending its reply.
    pub fn clear_history(&self) {
        self.history.clear();
        let mut phase = self.force_phase();
        if matches!(*phase, Phase::Error(_)) {
            *phase = Phase::Idle;
        }
        tracing::info!("Chat history cleared");
    }

    fn begin_send(&self) -> Result<SendGuard<'_>> {
        let mut phase = self.lock_phase()?;
        if *phase == Phase::Sending {
            return Err(AdvisorError::Busy);
        }
        *phase = Phase::Sending;
        Ok(SendGuard {
            orchestrator: self,
            pending_user_turn: None,
            finished: false,
        })
    }

    fn ensure_sending(&self) -> Result<()> {
        match &*self.lock_phase()? {
            Phase::Sending => Ok(()),
            other => Err(AdvisorError::Orchestration(format!(
                "unexpected phase while sending: {other:?}"
            ))),
        }
    }

    fn lock_phase(&self) -> Result<MutexGuard<'_, Phase>> {
        self.phase
            .lock()
            .map_err(|_| AdvisorError::Orchestration("state lock poisoned".to_string()))
    }

    /// Lock even if poisoned, for transitions that must always land.
    fn force_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

/// Holds the `Sending` phase for one `send_message` call.
///
/// If the send future is dropped before `finish`, the phase returns to
/// `Idle` and a still-unanswered user turn gets the fallback reply.
struct SendGuard<'a> {
    orchestrator: &'a Orchestrator,
    pending_user_turn: Option<u64>,
    finished: bool,
}

impl SendGuard<'_> {
    fn finish(mut self, phase: Phase) {
        self.finished = true;
        *self.orchestrator.force_phase() = phase;
    }
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        tracing::warn!("Send abandoned before completion");
        let history = &self.orchestrator.history;
        if let Some(id) = self.pending_user_turn {
            if history.find(id).is_some() {
                let fallback = history.new_turn(Speaker::Advisor, texts::FALLBACK_REPLY);
                history.append(fallback.clone());
                self.orchestrator.emit(ChatEvent::TurnAppended(fallback));
            }
        }
        *self.orchestrator.force_phase() = Phase::Idle;
        self.orchestrator.emit(ChatEvent::Idle);
    }
}
