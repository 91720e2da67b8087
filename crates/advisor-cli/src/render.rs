use advisor_core::{ChatState, Notice, NoticeLevel, Speaker, Turn};

/// One turn as printed in the terminal: header line, then the text.
pub fn format_turn(turn: &Turn, advisor_name: &str) -> String {
    let who = match turn.speaker {
        Speaker::User => "You",
        Speaker::Advisor => advisor_name,
    };
    format!("[{}] {} (#{})\n{}", turn.created_at, who, turn.id, turn.text)
}

pub fn format_history(turns: &[Turn], advisor_name: &str) -> String {
    if turns.is_empty() {
        return "No messages yet.".to_string();
    }
    turns
        .iter()
        .map(|t| format_turn(t, advisor_name))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => format!("{}: {}", notice.title, notice.message),
        NoticeLevel::Error => format!("[error] {}: {}", notice.title, notice.message),
    }
}

/// Latest advisor turn, the default target of `/save`.
pub fn latest_advisor_turn(state: &ChatState) -> Option<&Turn> {
    state.turns.iter().rev().find(|t| t.is_advisor())
}
