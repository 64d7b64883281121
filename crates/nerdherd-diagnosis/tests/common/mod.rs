//! In-memory collaborators for driving sessions without Bedrock or S3.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use uuid::Uuid;

use nerdherd_core::models::diagnosis::DiagnosisRecord;
use nerdherd_core::models::intake::IntakeProfile;
use nerdherd_core::models::message::Message;
use nerdherd_diagnosis::collaborators::{
    BoxFuture, Completer, DiagnosisStore, ModerationVerdict, Moderator,
};
use nerdherd_diagnosis::error::DiagnosisError;

pub fn profile() -> IntakeProfile {
    IntakeProfile {
        name: "Dana".to_string(),
        email: "dana@example.com".to_string(),
        device_type: "Laptop".to_string(),
        brand: "Lenovo".to_string(),
        model: "ThinkPad T14".to_string(),
        problem: "It shuts off randomly".to_string(),
    }
}

// ── Moderator ────────────────────────────────────────────────────────────────

pub enum ModerationMode {
    Allow,
    /// Flag any input containing the word.
    FlagWord(&'static str),
    Fail,
}

pub struct FakeModerator {
    mode: ModerationMode,
    pub calls: AtomicUsize,
}

impl FakeModerator {
    pub fn new(mode: ModerationMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Moderator for FakeModerator {
    fn moderate<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, Result<ModerationVerdict, DiagnosisError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                ModerationMode::Allow => Ok(ModerationVerdict { flagged: false }),
                ModerationMode::FlagWord(word) => Ok(ModerationVerdict {
                    flagged: text.contains(word),
                }),
                ModerationMode::Fail => Err(DiagnosisError::Moderation(
                    "service unavailable".to_string(),
                )),
            }
        })
    }
}

// ── Completer ────────────────────────────────────────────────────────────────

pub enum Scripted {
    Reply(String),
    Fail,
    Stall,
}

/// Plays back scripted replies in order and records every request.
pub struct FakeCompleter {
    script: Mutex<VecDeque<Scripted>>,
    pub requests: Mutex<Vec<(String, Vec<Message>)>>,
}

impl FakeCompleter {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            replies
                .into_iter()
                .map(|r| Scripted::Reply(r.into()))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> (String, Vec<Message>) {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl Completer for FakeCompleter {
    fn complete<'a>(
        &'a self,
        system_instruction: &'a str,
        history: &'a [Message],
    ) -> BoxFuture<'a, Result<String, DiagnosisError>> {
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap()
                .push((system_instruction.to_string(), history.to_vec()));
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Scripted::Reply("What else can you tell me?".to_string()));
            match next {
                Scripted::Reply(text) => Ok(text),
                Scripted::Fail => Err(DiagnosisError::Completion("connection reset".to_string())),
                Scripted::Stall => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok("too late".to_string())
                }
            }
        })
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    pub fail_saves: bool,
    pub saved: Mutex<Vec<DiagnosisRecord>>,
    pub appended: Mutex<Vec<(Uuid, Uuid)>>,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }
}

impl DiagnosisStore for MemoryStore {
    fn save_diagnosis<'a>(
        &'a self,
        record: &'a DiagnosisRecord,
    ) -> BoxFuture<'a, Result<(), DiagnosisError>> {
        Box::pin(async move {
            if self.fail_saves {
                return Err(DiagnosisError::Persistence("bucket missing".to_string()));
            }
            self.saved.lock().unwrap().push(record.clone());
            Ok(())
        })
    }

    fn append_diagnosis_to_user<'a>(
        &'a self,
        user_id: Uuid,
        record: &'a DiagnosisRecord,
    ) -> BoxFuture<'a, Result<(), DiagnosisError>> {
        Box::pin(async move {
            self.appended.lock().unwrap().push((user_id, record.id));
            Ok(())
        })
    }
}
