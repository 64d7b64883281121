use thiserror::Error;

use nerdherd_core::error::CoreError;

#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error("message is empty")]
    EmptyInput,

    #[error("question limit reached; the session accepts no more messages")]
    CutoffReached,

    #[error("invalid intake profile: {0}")]
    Profile(#[from] CoreError),

    #[error("moderation request failed: {0}")]
    Moderation(String),

    #[error("completion request failed: {0}")]
    Completion(String),

    #[error("persistence failed: {0}")]
    Persistence(String),
}
