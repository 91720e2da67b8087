// Library interface for advisor-cli
// This allows integration tests to access internal modules

// commands.rs and render.rs are also declared in main.rs, so the path
// attribute points both crates at the same source file.

#[path = "commands.rs"]
pub mod commands;

#[path = "render.rs"]
pub mod render;

// Re-export commonly used items for easier testing
pub use commands::{handle_command, CommandResult};
pub use render::{format_history, format_notice, format_turn};
