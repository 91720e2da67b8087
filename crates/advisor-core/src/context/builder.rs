use crate::constants::generation;
use crate::context::history::{Speaker, Turn};
use crate::llm::Message;

/// Assembles the message list for one completion request:
/// system prompt, recent turns, grounding context, then the user's question.
pub struct ContextBuilder {
    system_prompt: String,
    history: Vec<Turn>,
    history_limit: usize,
    grounding: Option<String>,
    user_query: String,
}

impl ContextBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            history_limit: generation::CONTEXT_TURNS,
            grounding: None,
            user_query: String::new(),
        }
    }

    /// Only the newest `history_limit` of these are kept.
    pub fn with_history(mut self, turns: &[Turn]) -> Self {
        self.history = turns.to_vec();
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Empty context is dropped.
    pub fn with_grounding(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.grounding = if context.trim().is_empty() { None } else { Some(context) };
        self
    }

    pub fn with_user_query(mut self, query: impl Into<String>) -> Self {
        self.user_query = query.into();
        self
    }

    pub fn build(self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history_limit + 3);
        messages.push(Message::system(self.system_prompt));

        let skip = self.history.len().saturating_sub(self.history_limit);
        for turn in self.history.into_iter().skip(skip) {
            messages.push(match turn.speaker {
                Speaker::User => Message::user(turn.text),
                Speaker::Advisor => Message::assistant(turn.text),
            });
        }

        if let Some(context) = self.grounding {
            messages.push(Message::user(format!("{}{}", generation::CONTEXT_PREFIX, context)));
        }

        messages.push(Message::user(self.user_query));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    fn turn(id: u64, speaker: Speaker, text: &str) -> Turn {
        Turn {
            id,
            speaker,
            text: text.to_string(),
            created_at: "10:00".to_string(),
        }
    }

    #[test]
    fn test_build_orders_messages() {
        let history = vec![
            turn(1, Speaker::User, "hi"),
            turn(2, Speaker::Advisor, "hello"),
        ];
        let messages = ContextBuilder::new("sys")
            .with_history(&history)
            .with_grounding("some facts")
            .with_user_query("question")
            .build();

        let roles: Vec<Role> = messages.iter().map(|m| m.role.clone()).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User, Role::User]
        );
        assert_eq!(messages[3].content, "Additional context: some facts");
        assert_eq!(messages[4].content, "question");
    }

    #[test]
    fn test_history_truncated_to_newest_five() {
        let history: Vec<Turn> = (1..=8)
            .map(|i| turn(i, Speaker::User, &format!("m{i}")))
            .collect();
        let messages = ContextBuilder::new("sys")
            .with_history(&history)
            .with_user_query("q")
            .build();

        // system + 5 history + query
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[1].content, "m4");
        assert_eq!(messages[5].content, "m8");
    }

    #[test]
    fn test_blank_grounding_is_not_injected() {
        let messages = ContextBuilder::new("sys")
            .with_grounding("   ")
            .with_user_query("q")
            .build();
        assert_eq!(messages.len(), 2);
        assert!(!messages.iter().any(|m| m.content.starts_with("Additional context")));
    }
}
