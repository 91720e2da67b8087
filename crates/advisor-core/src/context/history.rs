use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::constants::{keys, limits};
use crate::context::persistence::KeyValueStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Advisor,
}

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    /// Creation-order key, strictly increasing within a store.
    pub id: u64,
    pub speaker: Speaker,
    pub text: String,
    /// Local `HH:MM` display string. Not meant for ordering.
    pub created_at: String,
}

impl Turn {
    pub fn is_advisor(&self) -> bool {
        self.speaker == Speaker::Advisor
    }

    fn display_time() -> String {
        chrono::Local::now().format("%H:%M").to_string()
    }
}

struct HistoryState {
    turns: VecDeque<Turn>,
    hydrated: bool,
    last_id: u64,
}

/// Bounded, write-through conversation log.
///
/// Built once at startup and shared by `Arc`. The persisted copy is loaded
/// lazily on first access and rewritten after every mutation. Storage failures
/// are logged and never reach the caller; the in-memory sequence stays
/// authoritative for the session.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    max_turns: usize,
    state: Mutex<HistoryState>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            max_turns: limits::MAX_HISTORY_TURNS,
            state: Mutex::new(HistoryState {
                turns: VecDeque::new(),
                hydrated: false,
                last_id: 0,
            }),
        }
    }

    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max.max(1);
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Load the persisted sequence if that has not happened yet.
    /// Returns the number of turns in memory afterwards.
    pub fn hydrate(&self) -> usize {
        self.lock().turns.len()
    }

    /// Create a turn with the next id. The turn is not appended.
    pub fn new_turn(&self, speaker: Speaker, text: impl Into<String>) -> Turn {
        let mut state = self.lock();
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let id = now.max(state.last_id.saturating_add(1));
        state.last_id = id;

        Turn {
            id,
            speaker,
            text: text.into(),
            created_at: Turn::display_time(),
        }
    }

    pub fn append(&self, turn: Turn) {
        let mut state = self.lock();
        state.last_id = state.last_id.max(turn.id);
        state.turns.push_back(turn);
        while state.turns.len() > self.max_turns {
            state.turns.pop_front();
        }
        self.persist(&state.turns);
    }

    /// Owned snapshot, oldest first.
    pub fn get_history(&self) -> Vec<Turn> {
        self.lock().turns.iter().cloned().collect()
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Turn> {
        let state = self.lock();
        let skip = state.turns.len().saturating_sub(n);
        state.turns.iter().skip(skip).cloned().collect()
    }

    pub fn find(&self, id: u64) -> Option<Turn> {
        self.lock().turns.iter().find(|t| t.id == id).cloned()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.turns.clear();
        self.persist(&state.turns);
    }

    pub fn len(&self) -> usize {
        self.lock().turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().turns.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.hydrated {
            state.hydrated = true;
            let loaded = self.load();
            state.last_id = loaded.iter().map(|t| t.id).max().unwrap_or(0);
            state.turns = loaded;
        }
        state
    }

    fn load(&self) -> VecDeque<Turn> {
        let raw = match self.store.get(keys::CHAT_HISTORY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return VecDeque::new(),
            Err(e) => {
                tracing::warn!("Failed to read chat history: {e}");
                return VecDeque::new();
            }
        };

        match serde_json::from_str::<VecDeque<Turn>>(&raw) {
            Ok(mut turns) => {
                while turns.len() > self.max_turns {
                    turns.pop_front();
                }
                tracing::debug!(count = turns.len(), "Hydrated chat history");
                turns
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable chat history: {e}");
                VecDeque::new()
            }
        }
    }

    fn persist(&self, turns: &VecDeque<Turn>) {
        let result = serde_json::to_string(turns)
            .map_err(crate::error::AdvisorError::from)
            .and_then(|json| self.store.set(keys::CHAT_HISTORY, &json));

        if let Err(e) = result {
            tracing::warn!("Failed to persist chat history: {e}");
        }
    }
}
