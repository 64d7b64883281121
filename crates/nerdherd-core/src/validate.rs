//! Field validation shared by the intake and booking forms.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Reject a field that is empty after trimming.
pub fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::MissingField(field.to_string()));
    }
    Ok(())
}

/// Loose address check: something, `@`, something with a dot in it.
/// No whitespace anywhere, including at the ends.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// [`require`] followed by [`is_valid_email`].
pub fn require_email(field: &str, value: &str) -> Result<(), CoreError> {
    require(field, value)?;
    if !is_valid_email(value) {
        return Err(CoreError::InvalidEmail(value.to_string()));
    }
    Ok(())
}
