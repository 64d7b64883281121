//! Trigger-phrase detection.
//!
//! A reply is diagnostic when, after dropping everything except ASCII
//! letters, digits, and spaces and lowercasing, it contains
//! [`TRIGGER`]. So `"I HAVE A FEW IDEAS OF WHAT'S GOING ON!"` and
//! `"i have a few ideas of whats going on"` both count.

use std::ops::Range;

/// The normalized trigger phrase.
pub const TRIGGER: &str = "i have a few ideas of whats going on";

/// Inserted after the trigger when the reply does not already mention a free
/// diagnosis.
pub const FREE_DIAGNOSIS_MARKER: &str = "Here is your Free Diagnosis:";

pub fn is_diagnostic(text: &str) -> bool {
    locate_trigger(text).is_some()
}

/// Byte range of the first trigger phrase in `text`.
///
/// Matching happens on the normalized form; the range maps back onto the raw
/// text, from the first matched character to the last, plus one trailing
/// `.`, `!`, or `:` if present.
pub fn locate_trigger(text: &str) -> Option<Range<usize>> {
    // Normalized text is pure ASCII, so byte i of `normalized` came from the
    // raw char starting at `offsets[i]`.
    let mut normalized = String::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len());
    for (idx, c) in text.char_indices() {
        if c.is_ascii_alphanumeric() || c == ' ' {
            normalized.push(c.to_ascii_lowercase());
            offsets.push(idx);
        }
    }

    let start = normalized.find(TRIGGER)?;
    let last = start + TRIGGER.len() - 1;
    let mut end = offsets[last] + 1;
    if matches!(text[end..].chars().next(), Some('.' | '!' | ':')) {
        end += 1;
    }

    Some(offsets[start]..end)
}

/// Insert ` Here is your Free Diagnosis:` after the first trigger phrase,
/// unless the reply already says "free diagnosis" in any case.
pub fn mark_free_diagnosis(reply: &str) -> String {
    if reply.to_lowercase().contains("free diagnosis") {
        return reply.to_string();
    }

    match locate_trigger(reply) {
        Some(range) => {
            let mut marked =
                String::with_capacity(reply.len() + FREE_DIAGNOSIS_MARKER.len() + 1);
            marked.push_str(&reply[..range.end]);
            marked.push(' ');
            marked.push_str(FREE_DIAGNOSIS_MARKER);
            marked.push_str(&reply[range.end..]);
            marked
        }
        None => reply.to_string(),
    }
}
