use std::path::{Path, PathBuf};

use crate::constants::{paths, texts};

/// Builds the system prompt for the advisor persona.
/// Combines the persona directive, the formatting rules every reply must
/// follow, and optional user instructions.
pub struct SystemPromptBuilder {
    advisor_name: String,
    persona: Option<String>,
    custom_instructions: Option<String>,
}

impl SystemPromptBuilder {
    pub fn new() -> Self {
        Self {
            advisor_name: texts::ADVISOR_NAME.to_string(),
            persona: None,
            custom_instructions: None,
        }
    }

    pub fn with_advisor_name(mut self, name: impl Into<String>) -> Self {
        self.advisor_name = name.into();
        self
    }

    /// Replace the built-in persona directive.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        let persona = persona.into();
        self.persona = if persona.trim().is_empty() { None } else { Some(persona) };
        self
    }

    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }

    /// Load `instructions.md` from the advisor config directory, if present.
    pub fn load_user_instructions(self) -> Self {
        match Self::user_instructions_path() {
            Some(path) => self.load_instructions_from(&path),
            None => self,
        }
    }

    pub fn load_instructions_from(mut self, path: &Path) -> Self {
        if let Ok(content) = std::fs::read_to_string(path) {
            if !content.trim().is_empty() {
                tracing::debug!(path = %path.display(), "Loaded advisor instructions");
                self.custom_instructions = Some(content);
            }
        }
        self
    }

    fn user_instructions_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(paths::CONFIG_DIR).join("instructions.md"))
    }

    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(2048);

        match self.persona {
            Some(ref persona) => prompt.push_str(persona),
            None => prompt.push_str(&default_persona(&self.advisor_name)),
        }

        prompt.push_str(FORMATTING_RULES);

        if let Some(ref instructions) = self.custom_instructions {
            prompt.push_str("\n\n## Additional Instructions\n");
            prompt.push_str(instructions.trim());
        }

        prompt
    }
}

impl Default for SystemPromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_persona(name: &str) -> String {
    format!(
        "You are {name}, an experienced advisor. You help people think through questions about \
their studies, research, decisions and careers. You explain ideas clearly, ground your \
answers in well-established knowledge, and say so when you are unsure.\n\n\
## Tone\n\
- Warm but direct. Get to the point.\n\
- Prefer concrete examples over abstractions.\n\
- When additional context from a web search is provided, use it where relevant and ignore it where it is not."
    )
}

const FORMATTING_RULES: &str = "\n\n## Formatting Rules
IMPORTANT: when answering, follow these formatting rules:
1. Separate paragraphs with a blank line
2. Use single line breaks between list items
3. Do not use asterisks for bold or emphasis
4. Use # for main titles and ## for subtitles
5. Use - for bulleted lists
6. Use 1. 2. 3. for numbered lists
7. Leave a blank line before and after every title
8. Leave a blank line before and after every list";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_contains_persona_and_rules() {
        let prompt = SystemPromptBuilder::new().build();
        assert!(prompt.starts_with("You are Guido"));
        assert!(prompt.contains("## Formatting Rules"));
        assert!(prompt.contains("Do not use asterisks"));
        assert!(!prompt.contains("Additional Instructions"));
    }

    #[test]
    fn test_custom_persona_keeps_formatting_rules() {
        let prompt = SystemPromptBuilder::new()
            .with_persona("You are a terse tutor.")
            .with_custom_instructions("Answer in Portuguese.")
            .build();
        assert!(prompt.starts_with("You are a terse tutor."));
        assert!(prompt.contains("Use - for bulleted lists"));
        assert!(prompt.ends_with("Answer in Portuguese."));
    }

    #[test]
    fn test_load_instructions_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("instructions.md");
        std::fs::write(&path, "Cite sources.\n").unwrap();

        let prompt = SystemPromptBuilder::new().load_instructions_from(&path).build();
        assert!(prompt.ends_with("Cite sources."));

        let missing = SystemPromptBuilder::new()
            .load_instructions_from(&dir.path().join("nope.md"))
            .build();
        assert!(!missing.contains("Additional Instructions"));
    }
}
