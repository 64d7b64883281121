use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;
use crate::validate;

/// A repair booking lead as submitted by the booking form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RepairRequestForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub device_type: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    pub problem: String,
    #[serde(default)]
    pub contact_method: ContactMethod,
    #[serde(default)]
    pub repair_time: String,
    #[serde(default)]
    pub remote: bool,
}

/// A stored repair booking lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RepairRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub form: RepairRequestForm,
    pub created_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ContactMethod {
    Email,
    Phone,
    #[default]
    Either,
}

impl RepairRequestForm {
    /// Name, email, device type, and problem are required; the rest is
    /// optional.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate::require("name", &self.name)?;
        validate::require("email", &self.email)?;
        validate::require("device_type", &self.device_type)?;
        validate::require("problem", &self.problem)?;
        if !validate::is_valid_email(&self.email) {
            return Err(CoreError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

impl RepairRequest {
    /// Validate a submitted form and stamp it with an id and creation time.
    pub fn from_form(form: RepairRequestForm) -> Result<Self, CoreError> {
        form.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            form,
            created_at: jiff::Timestamp::now(),
        })
    }
}
