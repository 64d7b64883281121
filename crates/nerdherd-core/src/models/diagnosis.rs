use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::message::Message;
use super::problem::PossibleProblem;

/// Immutable snapshot written once a session reaches a diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiagnosisRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub conversation: Vec<Message>,
    pub possible_problems: Vec<PossibleProblem>,
    pub created_at: jiff::Timestamp,
}
