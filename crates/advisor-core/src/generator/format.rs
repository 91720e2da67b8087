//! Normalizes raw completion text into the plain-text layout the front-end
//! expects: blocks separated by one blank line, `#` headings, `-` bullets,
//! `N.` numbered items, and no emphasis markers.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s*(\S.*)$").expect("valid heading regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•+]\s+(\S.*)$").expect("valid bullet regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})[.)]\s+(\S.*)$").expect("valid numbered regex"));
static SINGLE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(\S[^*\n]*?)\*").expect("valid emphasis regex"));
static DOUBLE_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__([^_\n](?:[^\n]*?[^_\n])?)__").expect("valid underscore emphasis regex")
});
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])[ \t]+(\S)").expect("valid sentence regex"));
static EXTRA_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

#[derive(Debug, PartialEq)]
enum Block {
    Heading(String),
    List(Vec<String>),
    Paragraph(String),
}

pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace("**", "");
    let text = strip_underscore_emphasis(&text);

    let mut blocks: Vec<Block> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            blocks.push(Block::Heading(format!(
                "{} {}",
                &caps[1],
                strip_inline_emphasis(caps[2].trim())
            )));
            continue;
        }

        let item = if let Some(caps) = BULLET.captures(line) {
            Some(format!("- {}", strip_inline_emphasis(&caps[1])))
        } else {
            NUMBERED
                .captures(line)
                .map(|caps| format!("{}. {}", &caps[1], strip_inline_emphasis(&caps[2])))
        };

        match item {
            Some(item) => match blocks.last_mut() {
                Some(Block::List(items)) => items.push(item),
                _ => blocks.push(Block::List(vec![item])),
            },
            None => blocks.push(Block::Paragraph(split_sentences(&strip_inline_emphasis(line)))),
        }
    }

    let joined = blocks
        .into_iter()
        .map(|block| match block {
            Block::Heading(h) => h,
            Block::List(items) => items.join("\n"),
            Block::Paragraph(p) => p,
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    EXTRA_BREAKS.replace_all(&joined, "\n\n").trim().to_string()
}

/// `__text__` loses its markers; lowercase identifiers like `__init__` stay.
fn strip_underscore_emphasis(text: &str) -> String {
    DOUBLE_UNDERSCORE
        .replace_all(text, |caps: &Captures| {
            let inner = &caps[1];
            let identifier = inner
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
            if identifier {
                caps[0].to_string()
            } else {
                inner.to_string()
            }
        })
        .into_owned()
}

fn strip_inline_emphasis(text: &str) -> String {
    SINGLE_EMPHASIS.replace_all(text, "$1").into_owned()
}

/// Breaks a paragraph after sentence-ending punctuation, but only when the
/// next sentence visibly starts (capital letter, digit, or opening quote).
/// Keeps "e.g. this" and "3.5 million" intact.
fn split_sentences(paragraph: &str) -> String {
    SENTENCE_END
        .replace_all(paragraph, |caps: &Captures| {
            let next = &caps[2];
            let starts_sentence = next
                .chars()
                .next()
                .map(|c| c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(' | '“'))
                .unwrap_or(false);
            if starts_sentence {
                format!("{}\n\n{}", &caps[1], next)
            } else {
                format!("{} {}", &caps[1], next)
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bold_and_splits_sentences() {
        let out = normalize("Title one.\n**Point A.** Point B.");
        assert!(!out.contains("**"));
        assert!(out.contains("\n\n"));
        assert_eq!(out, "Title one.\n\nPoint A.\n\nPoint B.");
    }

    #[test]
    fn test_headings_are_padded_and_normalized() {
        let out = normalize("##Overview\nLoss aversion matters.\n# **Summary**");
        assert_eq!(out, "## Overview\n\nLoss aversion matters.\n\n# Summary");
    }

    #[test]
    fn test_list_items_stay_on_single_lines() {
        let raw = "Key ideas:\n* first\n\n- second\n+ third\n1) one\n2. two\nAfter the list.";
        let out = normalize(raw);
        assert_eq!(
            out,
            "Key ideas:\n\n- first\n- second\n- third\n1. one\n2. two\n\nAfter the list."
        );
    }

    #[test]
    fn test_no_split_before_lowercase_or_decimals() {
        let out = normalize("Use heuristics, e.g. anchoring. It costs 3.5 dollars.");
        assert_eq!(out, "Use heuristics, e.g. anchoring.\n\nIt costs 3.5 dollars.");
    }

    #[test]
    fn test_single_asterisk_emphasis_removed() {
        assert_eq!(normalize("This is *really* important"), "This is really important");
    }

    #[test]
    fn test_underscore_emphasis_removed_but_dunders_kept() {
        assert_eq!(
            normalize("Call __init__ first and read __the notes__."),
            "Call __init__ first and read the notes."
        );
        assert_eq!(normalize("__Important__ point"), "Important point");
        assert_eq!(normalize("Check __name__ == __main__"), "Check __name__ == __main__");
    }

    #[test]
    fn test_collapses_blank_runs_and_trims() {
        let out = normalize("\n\n\n  First paragraph\n\n\n\n\nSecond paragraph  \n\n");
        assert_eq!(out, "First paragraph\n\nSecond paragraph");
        assert!(!out.contains("\n\n\n"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \n \n"), "");
    }
}
