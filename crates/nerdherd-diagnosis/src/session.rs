//! The diagnosis conversation controller.
//!
//! A session owns one transcript and runs one user turn at a time to
//! completion:
//!
//! 1. Moderate the input. Flagged input gets a refusal and goes no further.
//! 2. Append the user turn and replay the whole transcript, behind the
//!    system instruction, to the completion model.
//! 3. Classify the reply. A diagnostic reply ends the questioning phase and
//!    hands a snapshot to the persistence worker. Anything else counts as a
//!    question, and the session cuts off once the question limit is hit.
//!
//! Collaborator failures never escape a turn: they become an apology in the
//! transcript and the session stays open.
//!
//! `submit_user_turn` takes `&mut self`, so a single session can never have
//! two turns in flight. Callers that share sessions across tasks must wrap
//! them in a lock and reject contention.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use nerdherd_core::heuristics::{PhraseInterpreter, ReplyInterpreter};
use nerdherd_core::models::diagnosis::DiagnosisRecord;
use nerdherd_core::models::intake::IntakeProfile;
use nerdherd_core::models::message::Message;
use nerdherd_core::models::problem::{PossibleProblem, normalize_problems};

use crate::collaborators::{BoxFuture, Completer, Moderator};
use crate::error::DiagnosisError;
use crate::persist::DiagnosisEvent;
use crate::prompt;

pub const DEFAULT_MAX_QUESTIONS: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const FLAGGED_REFUSAL: &str = "Sorry, your message appears to contain inappropriate or unsafe language. Please rephrase and try again.";
pub const CONTACT_FAILURE: &str = "Sorry, there was a problem contacting the diagnosis bot.";
pub const TIMEOUT_FAILURE: &str =
    "Sorry, the diagnosis bot took too long to respond. Please try again.";
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I could not generate a response.";
pub const CUTOFF_NOTICE: &str = "I've asked as many questions as I can. For further help, please reach out to a NerdHerd tech for a more in-depth diagnosis!";

// ── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Non-diagnostic replies allowed before the session cuts off.
    pub max_questions: u32,
    /// Limit on each moderation and completion call.
    pub request_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUESTIONS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// The services a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub moderator: Arc<dyn Moderator>,
    pub completer: Arc<dyn Completer>,
    pub interpreter: Arc<dyn ReplyInterpreter>,
}

impl Collaborators {
    /// Use the trigger-phrase interpreter.
    pub fn new(moderator: Arc<dyn Moderator>, completer: Arc<dyn Completer>) -> Self {
        Self {
            moderator,
            completer,
            interpreter: Arc::new(PhraseInterpreter),
        }
    }
}

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Disposition {
    Questioning,
    Diagnosed,
    CutOff,
}

/// How a single turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TurnOutcome {
    /// An ordinary assistant reply; one more question asked.
    Replied,
    /// The reply was a diagnosis.
    Diagnosed,
    /// Moderation rejected the input.
    Flagged,
    /// A collaborator failed or timed out.
    Failed,
    /// The reply used up the last question.
    CutOff,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    /// Messages added to the transcript by this turn, in order.
    pub appended: Vec<Message>,
    pub questions_asked: u32,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub profile: IntakeProfile,
    pub transcript: Vec<Message>,
    pub questions_asked: u32,
    pub diagnosis_reached: bool,
    pub cutoff_reached: bool,
    pub disposition: Disposition,
    pub possible_problems: Vec<PossibleProblem>,
}

/// Why a collaborator call produced no result.
enum CallFailure {
    TimedOut,
    Failed(DiagnosisError),
}

impl CallFailure {
    fn apology(&self) -> &'static str {
        match self {
            CallFailure::TimedOut => TIMEOUT_FAILURE,
            CallFailure::Failed(_) => CONTACT_FAILURE,
        }
    }
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallFailure::TimedOut => f.write_str("timed out"),
            CallFailure::Failed(e) => e.fmt(f),
        }
    }
}

async fn call_with_timeout<T>(
    limit: Duration,
    call: BoxFuture<'_, Result<T, DiagnosisError>>,
) -> Result<T, CallFailure> {
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CallFailure::Failed(e)),
        Err(_) => Err(CallFailure::TimedOut),
    }
}

// ── Session ──────────────────────────────────────────────────────────────────

pub struct DiagnosisSession {
    id: Uuid,
    user_id: Option<Uuid>,
    profile: IntakeProfile,
    system_instruction: String,
    transcript: Vec<Message>,
    questions_asked: u32,
    diagnosis_reached: bool,
    cutoff_reached: bool,
    possible_problems: Vec<PossibleProblem>,
    settings: SessionSettings,
    collaborators: Collaborators,
    events: mpsc::UnboundedSender<DiagnosisEvent>,
}

impl DiagnosisSession {
    /// Open a session for a completed intake profile.
    ///
    /// `user_id` is the stored intake record that diagnoses get appended to,
    /// if there is one. The transcript starts with the greeting.
    pub fn start(
        profile: IntakeProfile,
        user_id: Option<Uuid>,
        collaborators: Collaborators,
        settings: SessionSettings,
        events: mpsc::UnboundedSender<DiagnosisEvent>,
    ) -> Result<Self, DiagnosisError> {
        profile.validate()?;

        let id = Uuid::new_v4();
        info!(session_id = %id, user_id = ?user_id, "diagnosis session started");

        Ok(Self {
            id,
            user_id,
            system_instruction: prompt::system_instruction(&profile),
            transcript: prompt::greeting(&profile),
            profile,
            questions_asked: 0,
            diagnosis_reached: false,
            cutoff_reached: false,
            possible_problems: Vec::new(),
            settings,
            collaborators,
            events,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn questions_asked(&self) -> u32 {
        self.questions_asked
    }

    pub fn diagnosis_reached(&self) -> bool {
        self.diagnosis_reached
    }

    pub fn cutoff_reached(&self) -> bool {
        self.cutoff_reached
    }

    /// Problems named by the most recent diagnostic reply. Empty until a
    /// diagnosis is reached.
    pub fn possible_problems(&self) -> &[PossibleProblem] {
        &self.possible_problems
    }

    pub fn disposition(&self) -> Disposition {
        if self.cutoff_reached {
            Disposition::CutOff
        } else if self.diagnosis_reached {
            Disposition::Diagnosed
        } else {
            Disposition::Questioning
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            user_id: self.user_id,
            profile: self.profile.clone(),
            transcript: self.transcript.clone(),
            questions_asked: self.questions_asked,
            diagnosis_reached: self.diagnosis_reached,
            cutoff_reached: self.cutoff_reached,
            disposition: self.disposition(),
            possible_problems: self.possible_problems.clone(),
        }
    }

    /// Run one user turn.
    ///
    /// Rejected without side effects when `text` is blank or the session has
    /// already cut off. Every other path returns a report, including
    /// collaborator failures.
    pub async fn submit_user_turn(&mut self, text: &str) -> Result<TurnReport, DiagnosisError> {
        if self.cutoff_reached {
            return Err(DiagnosisError::CutoffReached);
        }
        if text.trim().is_empty() {
            return Err(DiagnosisError::EmptyInput);
        }

        let before = self.transcript.len();
        let outcome = self.run_turn(text).await;

        info!(
            session_id = %self.id,
            outcome = ?outcome,
            questions_asked = self.questions_asked,
            "turn complete"
        );

        Ok(TurnReport {
            outcome,
            appended: self.transcript[before..].to_vec(),
            questions_asked: self.questions_asked,
            disposition: self.disposition(),
        })
    }

    async fn run_turn(&mut self, text: &str) -> TurnOutcome {
        let limit = self.settings.request_timeout;

        let moderator = Arc::clone(&self.collaborators.moderator);
        match call_with_timeout(limit, moderator.moderate(text)).await {
            Ok(verdict) if verdict.flagged => {
                info!(session_id = %self.id, "user message flagged by moderation");
                self.transcript.push(Message::assistant(FLAGGED_REFUSAL));
                return TurnOutcome::Flagged;
            }
            Ok(_) => {}
            Err(failure) => {
                warn!(session_id = %self.id, error = %failure, "moderation call failed");
                self.transcript.push(Message::assistant(failure.apology()));
                return TurnOutcome::Failed;
            }
        }

        self.transcript.push(Message::user(text));

        let completer = Arc::clone(&self.collaborators.completer);
        let reply = match call_with_timeout(
            limit,
            completer.complete(&self.system_instruction, &self.transcript),
        )
        .await
        {
            Ok(reply) if reply.trim().is_empty() => EMPTY_REPLY_FALLBACK.to_string(),
            Ok(reply) => reply,
            Err(failure) => {
                warn!(session_id = %self.id, error = %failure, "completion call failed");
                self.transcript.push(Message::assistant(failure.apology()));
                return TurnOutcome::Failed;
            }
        };

        let interpreter = Arc::clone(&self.collaborators.interpreter);
        if interpreter.is_diagnostic(&reply) {
            let stored = interpreter.rewrite_diagnostic(&reply);
            self.possible_problems = normalize_problems(interpreter.extract(&stored));
            self.transcript.push(Message::assistant(stored));

            if !self.diagnosis_reached {
                self.diagnosis_reached = true;
                self.emit_diagnosis();
            }
            return TurnOutcome::Diagnosed;
        }

        self.transcript.push(Message::assistant(reply));
        self.questions_asked += 1;

        if !self.diagnosis_reached && self.questions_asked >= self.settings.max_questions {
            self.cutoff_reached = true;
            self.transcript.push(Message::assistant(CUTOFF_NOTICE));
            info!(
                session_id = %self.id,
                questions_asked = self.questions_asked,
                "question limit reached"
            );
            return TurnOutcome::CutOff;
        }

        TurnOutcome::Replied
    }

    /// Hand the finished conversation to the persistence worker without
    /// waiting on it.
    fn emit_diagnosis(&self) {
        let record = DiagnosisRecord {
            id: Uuid::new_v4(),
            session_id: self.id,
            conversation: self.transcript.clone(),
            possible_problems: self.possible_problems.clone(),
            created_at: jiff::Timestamp::now(),
        };

        info!(
            session_id = %self.id,
            diagnosis_id = %record.id,
            problems = record.possible_problems.len(),
            "diagnosis reached"
        );

        let event = DiagnosisEvent {
            user_id: self.user_id,
            record,
        };
        if self.events.send(event).is_err() {
            warn!(session_id = %self.id, "persistence worker is gone; diagnosis not saved");
        }
    }
}
