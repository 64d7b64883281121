use thiserror::Error;

use nerdherd_diagnosis::error::DiagnosisError;

#[derive(Debug, Error)]
pub enum BedrockError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("guardrail request failed: {0}")]
    Guardrail(String),

    #[error("request could not be built: {0}")]
    Build(String),
}

impl BedrockError {
    pub(crate) fn into_completion(self) -> DiagnosisError {
        DiagnosisError::Completion(self.to_string())
    }

    pub(crate) fn into_moderation(self) -> DiagnosisError {
        DiagnosisError::Moderation(self.to_string())
    }
}
