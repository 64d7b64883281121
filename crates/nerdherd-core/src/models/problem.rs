use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A likely cause surfaced by a diagnostic reply.
///
/// Derived from the assistant's text, never authoritative. A fresh list
/// replaces the old one whenever a new diagnostic reply arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PossibleProblem {
    pub title: String,
    pub description: String,
    pub chart_data: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// What a reply interpreter yields: either bare text pulled out of the reply
/// or an already-structured problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProblemEntry {
    Text(String),
    Structured(PossibleProblem),
}

impl ProblemEntry {
    /// Coerce to the persisted shape. Bare text becomes the title with an
    /// empty description and no chart data.
    pub fn normalize(self) -> PossibleProblem {
        match self {
            ProblemEntry::Text(title) => PossibleProblem {
                title,
                description: String::new(),
                chart_data: Vec::new(),
            },
            ProblemEntry::Structured(problem) => problem,
        }
    }
}

impl From<String> for ProblemEntry {
    fn from(text: String) -> Self {
        ProblemEntry::Text(text)
    }
}

pub fn normalize_problems(entries: Vec<ProblemEntry>) -> Vec<PossibleProblem> {
    entries.into_iter().map(ProblemEntry::normalize).collect()
}
