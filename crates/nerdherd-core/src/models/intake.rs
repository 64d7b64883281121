use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::validate;

/// User and device details captured before a diagnosis chat starts.
///
/// Read-only for the lifetime of a session; every field is injected into the
/// system instruction sent with each completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IntakeProfile {
    pub name: String,
    pub email: String,
    pub device_type: String,
    pub brand: String,
    pub model: String,
    pub problem: String,
}

impl IntakeProfile {
    /// Every intake step is required.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::require("name", &self.name)?;
        validate::require_email("email", &self.email)?;
        validate::require("device_type", &self.device_type)?;
        validate::require("brand", &self.brand)?;
        validate::require("model", &self.model)?;
        validate::require("problem", &self.problem)?;
        Ok(())
    }
}
