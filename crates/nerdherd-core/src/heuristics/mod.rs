//! Reply heuristics: deciding whether an assistant reply is a diagnosis and
//! pulling possible problems out of it.
//!
//! The rules are literal string matching over free-form model output. They
//! sit behind [`ReplyInterpreter`] so a structured-output contract can replace
//! them without touching turn-taking.

pub mod extract;
pub mod phrase;

use crate::models::problem::ProblemEntry;

/// Interprets assistant replies for the diagnosis controller.
pub trait ReplyInterpreter: Send + Sync {
    /// Whether the reply ends the questioning phase.
    fn is_diagnostic(&self, reply: &str) -> bool;

    /// Rewrite a diagnostic reply before it is stored in the transcript.
    fn rewrite_diagnostic(&self, reply: &str) -> String;

    /// Possible problems named by a diagnostic reply.
    fn extract(&self, reply: &str) -> Vec<ProblemEntry>;
}

/// The trigger-phrase rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseInterpreter;

impl ReplyInterpreter for PhraseInterpreter {
    fn is_diagnostic(&self, reply: &str) -> bool {
        phrase::is_diagnostic(reply)
    }

    fn rewrite_diagnostic(&self, reply: &str) -> String {
        phrase::mark_free_diagnosis(reply)
    }

    fn extract(&self, reply: &str) -> Vec<ProblemEntry> {
        extract::extract_possible_problems(reply)
            .into_iter()
            .map(ProblemEntry::Text)
            .collect()
    }
}
