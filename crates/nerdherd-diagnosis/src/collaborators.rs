//! External services the conversation depends on.
//!
//! Each is a narrow async trait so the controller can run against Bedrock and
//! S3 in production and against in-memory fakes in tests.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nerdherd_core::models::diagnosis::DiagnosisRecord;
use nerdherd_core::models::message::Message;

use crate::error::DiagnosisError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub flagged: bool,
}

/// Screens user input before it reaches the model.
pub trait Moderator: Send + Sync {
    fn moderate<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<ModerationVerdict, DiagnosisError>>;
}

/// Produces the assistant's next reply.
///
/// Stateless: the full history is passed on every call, oldest first.
pub trait Completer: Send + Sync {
    fn complete<'a>(
        &'a self,
        system_instruction: &'a str,
        history: &'a [Message],
    ) -> BoxFuture<'a, Result<String, DiagnosisError>>;
}

/// Durable home for finished diagnoses.
pub trait DiagnosisStore: Send + Sync {
    fn save_diagnosis<'a>(
        &'a self,
        record: &'a DiagnosisRecord,
    ) -> BoxFuture<'a, Result<(), DiagnosisError>>;

    /// Append to the user record created at intake.
    fn append_diagnosis_to_user<'a>(
        &'a self,
        user_id: Uuid,
        record: &'a DiagnosisRecord,
    ) -> BoxFuture<'a, Result<(), DiagnosisError>>;
}
