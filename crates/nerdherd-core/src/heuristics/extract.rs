//! Possible-problem extraction from a diagnostic reply.
//!
//! Line rules, first match wins per line:
//!
//! 1. `- text` or `* text` → `text`
//! 2. `**text**...` → the line with every `**` removed
//! 3. `12. text` → `text`
//! 4. `Label: ...` → the whole line
//!
//! When no line matches, everything after the trigger phrase is split on
//! newlines and periods instead, skipping an inserted free-diagnosis marker.
//! The result is deduplicated in first-occurrence order with empty entries
//! dropped.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::phrase::{FREE_DIAGNOSIS_MARKER, locate_trigger};

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*.+\*\*").expect("bold pattern is valid"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\. ").expect("numbered pattern is valid"));
static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+:").expect("label pattern is valid"));

/// Pull problem titles out of a diagnostic reply.
///
/// `text` is the reply as stored in the transcript, after the session has
/// inserted [`FREE_DIAGNOSIS_MARKER`] behind the trigger phrase. The marker
/// is session output rather than model output, so the sentence fallback
/// skips it.
pub fn extract_possible_problems(text: &str) -> Vec<String> {
    let mut found = Vec::new();

    for line in text.split('\n') {
        let trimmed = line.trim();
        if let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            found.push(rest.to_string());
        } else if BOLD.is_match(trimmed) {
            found.push(trimmed.replace("**", ""));
        } else if let Some(marker) = NUMBERED.find(trimmed) {
            found.push(trimmed[marker.end()..].to_string());
        } else if LABEL.is_match(trimmed) {
            found.push(trimmed.to_string());
        }
    }

    if found.is_empty()
        && let Some(trigger) = locate_trigger(text)
    {
        let after = text[trigger.end..].trim_start();
        let after = after.strip_prefix(FREE_DIAGNOSIS_MARKER).unwrap_or(after);
        found.extend(
            after
                .split(['\n', '.'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }

    dedupe(found)
}

fn dedupe(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| !e.is_empty() && seen.insert(e.clone()))
        .collect()
}
