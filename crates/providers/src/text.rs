//! Text cleanup applied before synthesis and after generation.

use std::sync::OnceLock;

use regex::Regex;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn space_before_punct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+([.,!?;:])").expect("valid regex"))
}

fn space_after_punct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([.,!?;:])\s*").expect("valid regex"))
}

/// Normalize text for the speech service: single spaces, no space before
/// `.,!?;:`, exactly one space after them, trimmed.
pub fn normalize_speech_text(text: &str) -> String {
    let collapsed = whitespace_run().replace_all(text, " ");
    let attached = space_before_punct().replace_all(&collapsed, "$1");
    let spaced = space_after_punct().replace_all(&attached, "$1 ");
    spaced.trim().to_string()
}

/// Strip one wrapping quote from each end and make sure the question ends
/// with `?`.
pub fn clean_generated_question(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_suffix(['"', '\''])
        .unwrap_or(trimmed);
    let mut question = trimmed.trim().to_string();
    if !question.ends_with('?') {
        question.push('?');
    }
    question
}
