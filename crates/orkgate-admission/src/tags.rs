//! Fallback agent-tag detection.
//!
//! Hosts do not always put the worker kind in a structured field. When the
//! tag is missing, the free-text prompt and description are scanned for an
//! explicit `subagent_type: <tag>` style assignment, then for any known tag
//! mentioned verbatim.

use std::sync::LazyLock;

use orkgate_core::AgentTag;
use regex::Regex;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:subagent_type|subagent|agent_type|agent)",
        r#"\s*[:=]\s*["'`]?([a-z0-9][a-z0-9_-]*)"#,
    ))
    .expect("valid regex")
});

/// Resolve the agent tag for a spawn request.
///
/// `explicit` wins when non-blank. Otherwise each text is scanned in order
/// for an assignment, then for any of `known_tags` as a whole word. Falls
/// back to [`AgentTag::default`].
pub fn resolve_tag(explicit: Option<&str>, texts: &[&str], known_tags: &[String]) -> AgentTag {
    if let Some(tag) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return AgentTag::from(tag);
    }
    if let Some(tag) = texts.iter().find_map(|text| detect_assignment(text)) {
        return tag;
    }
    if let Some(tag) = texts.iter().find_map(|text| detect_known(text, known_tags)) {
        return tag;
    }
    AgentTag::default()
}

fn detect_assignment(text: &str) -> Option<AgentTag> {
    ASSIGNMENT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| AgentTag::from(m.as_str().to_ascii_lowercase()))
}

fn detect_known(text: &str, known_tags: &[String]) -> Option<AgentTag> {
    let lower = text.to_ascii_lowercase();
    known_tags
        .iter()
        .find(|tag| contains_word(&lower, &tag.to_ascii_lowercase()))
        .map(|tag| AgentTag::from(tag.as_str()))
}

/// Whole-word containment where `-` and `_` count as word characters.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
