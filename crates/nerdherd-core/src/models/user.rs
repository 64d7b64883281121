use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::diagnosis::DiagnosisRecord;
use super::intake::IntakeProfile;

/// A stored intake profile. Diagnoses reached in later sessions are
/// appended to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserRecord {
    pub id: Uuid,
    pub profile: IntakeProfile,
    #[serde(default)]
    pub diagnoses: Vec<DiagnosisRecord>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl UserRecord {
    pub fn new(profile: IntakeProfile) -> Self {
        let now = jiff::Timestamp::now();
        Self {
            id: Uuid::new_v4(),
            profile,
            diagnoses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append with array-union semantics: a diagnosis already present (same
    /// id) is not added twice. Returns whether the record changed.
    pub fn add_diagnosis(&mut self, diagnosis: DiagnosisRecord) -> bool {
        if self.diagnoses.iter().any(|d| d.id == diagnosis.id) {
            return false;
        }
        self.diagnoses.push(diagnosis);
        self.updated_at = jiff::Timestamp::now();
        true
    }
}
