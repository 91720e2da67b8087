/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Clear the chat history.
    Clear,
    /// Quit the application.
    Quit,
    /// Print the stored conversation.
    ShowHistory,
    /// Export the turn with this id.
    SaveTurn(u64),
    /// Export the most recent advisor reply.
    SaveLatest,
    /// Print the Google consent URL and open it.
    StartAuth,
    /// Finish sign-in with an authorization code or redirect URL.
    CompleteAuth(String),
    /// Forget the stored Google token.
    Logout,
    /// Show provider, model and sign-in status.
    ShowStatus,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/clear" => CommandResult::Clear,
        "/history" => CommandResult::ShowHistory,
        "/status" => CommandResult::ShowStatus,

        "/save" => {
            if arg.is_empty() {
                return CommandResult::SaveLatest;
            }
            match arg.trim_start_matches('#').parse::<u64>() {
                Ok(id) => CommandResult::SaveTurn(id),
                Err(_) => CommandResult::Message(format!(
                    "Invalid message id: {arg}. Usage: /save [id] (ids are shown by /history)"
                )),
            }
        }
        "/auth" | "/login" => {
            if arg.is_empty() {
                CommandResult::StartAuth
            } else {
                CommandResult::CompleteAuth(arg.to_string())
            }
        }
        "/logout" => CommandResult::Logout,
        "/version" => CommandResult::Message(format!("Advisor CLI v{}", env!("CARGO_PKG_VERSION"))),

        // Unknown command
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
╭─ Advisor Commands ─────────────────────────────────────────────╮

  CHAT
    /history                  Show the stored conversation with ids
    /clear                    Clear chat history
    /status                   Show provider, model and sign-in state

  GOOGLE DOCS
    /save [id]                Save a reply (default: the latest one)
    /auth                     Sign in with Google
    /auth <code|url>          Finish sign-in with the returned code
    /logout                   Forget the stored Google token

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit the application

╰────────────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}
