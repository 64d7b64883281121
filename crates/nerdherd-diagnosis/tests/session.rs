mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use nerdherd_core::models::message::{Message, Sender};
use nerdherd_diagnosis::error::DiagnosisError;
use nerdherd_diagnosis::persist::DiagnosisEvent;
use nerdherd_diagnosis::session::{
    CONTACT_FAILURE, CUTOFF_NOTICE, Collaborators, DiagnosisSession, Disposition,
    EMPTY_REPLY_FALLBACK, FLAGGED_REFUSAL, SessionSettings, TIMEOUT_FAILURE, TurnOutcome,
};

use common::{FakeCompleter, FakeModerator, ModerationMode, Scripted, profile};

const QUESTION: &str = "Does it shut off while charging?";
const DIAGNOSIS: &str =
    "Thanks, Dana. I have a few ideas of what's going on!\n- Worn battery\n- Overheating\n";

struct Harness {
    session: DiagnosisSession,
    moderator: Arc<FakeModerator>,
    completer: Arc<FakeCompleter>,
    events: mpsc::UnboundedReceiver<DiagnosisEvent>,
}

fn harness(mode: ModerationMode, completer: FakeCompleter, settings: SessionSettings) -> Harness {
    let moderator = Arc::new(FakeModerator::new(mode));
    let completer = Arc::new(completer);
    let (tx, events) = mpsc::unbounded_channel();
    let session = DiagnosisSession::start(
        profile(),
        Some(Uuid::new_v4()),
        Collaborators::new(moderator.clone(), completer.clone()),
        settings,
        tx,
    )
    .unwrap();
    Harness {
        session,
        moderator,
        completer,
        events,
    }
}

fn allow(completer: FakeCompleter) -> Harness {
    harness(ModerationMode::Allow, completer, SessionSettings::default())
}

// ── Start ────────────────────────────────────────────────────────────────────

#[test]
fn start_seeds_greeting() {
    let h = allow(FakeCompleter::replies(Vec::<String>::new()));
    let transcript = h.session.transcript();
    assert_eq!(transcript.len(), 3);
    assert!(transcript.iter().all(Message::is_assistant));
    assert!(transcript[0].text.starts_with("Hi Dana!"));
    assert_eq!(transcript[1].text, "You said: \"It shuts off randomly\"");
    assert_eq!(h.session.questions_asked(), 0);
    assert_eq!(h.session.disposition(), Disposition::Questioning);
    assert!(h.session.possible_problems().is_empty());
}

#[test]
fn start_rejects_incomplete_profile() {
    let mut incomplete = profile();
    incomplete.problem = "  ".to_string();
    let (tx, _rx) = mpsc::unbounded_channel();
    let result = DiagnosisSession::start(
        incomplete,
        None,
        Collaborators::new(
            Arc::new(FakeModerator::new(ModerationMode::Allow)),
            Arc::new(FakeCompleter::replies(Vec::<String>::new())),
        ),
        SessionSettings::default(),
        tx,
    );
    assert!(matches!(result, Err(DiagnosisError::Profile(_))));
}

// ── Ordinary turns ───────────────────────────────────────────────────────────

#[tokio::test]
async fn ordinary_reply_counts_one_question() {
    let mut h = allow(FakeCompleter::replies([QUESTION]));

    let report = h.session.submit_user_turn("It just dies").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Replied);
    assert_eq!(
        report.appended,
        vec![Message::user("It just dies"), Message::assistant(QUESTION)]
    );
    assert_eq!(report.questions_asked, 1);
    assert_eq!(report.disposition, Disposition::Questioning);
    assert_eq!(h.session.transcript().len(), 5);
}

#[tokio::test]
async fn completer_receives_instruction_and_full_history() {
    let mut h = allow(FakeCompleter::replies([QUESTION, QUESTION]));

    h.session.submit_user_turn("first").await.unwrap();
    h.session.submit_user_turn("  second, verbatim  ").await.unwrap();

    let (instruction, history) = h.completer.last_request();
    assert!(instruction.contains("Name: Dana"));
    assert!(instruction.contains("Device: Laptop (Lenovo ThinkPad T14)"));
    assert!(instruction.contains("Problem: It shuts off randomly"));

    // Greeting, first exchange, then the new user turn exactly as typed.
    assert_eq!(history.len(), 6);
    assert_eq!(history[3], Message::user("first"));
    assert_eq!(history[5], Message::user("  second, verbatim  "));
    assert_eq!(history[5].sender, Sender::User);
}

#[tokio::test]
async fn empty_reply_becomes_fallback_and_counts() {
    let mut h = allow(FakeCompleter::replies(["   \n"]));

    let report = h.session.submit_user_turn("hello").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Replied);
    assert_eq!(report.appended[1], Message::assistant(EMPTY_REPLY_FALLBACK));
    assert_eq!(report.questions_asked, 1);
}

// ── Rejections ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_input_is_rejected_without_calls() {
    let mut h = allow(FakeCompleter::replies([QUESTION]));

    let err = h.session.submit_user_turn(" \t\n").await.unwrap_err();

    assert!(matches!(err, DiagnosisError::EmptyInput));
    assert_eq!(h.session.transcript().len(), 3);
    assert_eq!(h.moderator.calls(), 0);
    assert_eq!(h.completer.calls(), 0);
}

#[tokio::test]
async fn flagged_input_gets_refusal_only() {
    let mut h = harness(
        ModerationMode::FlagWord("darn"),
        FakeCompleter::replies([QUESTION]),
        SessionSettings::default(),
    );

    let report = h.session.submit_user_turn("this darn thing").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Flagged);
    assert_eq!(report.appended, vec![Message::assistant(FLAGGED_REFUSAL)]);
    assert_eq!(report.questions_asked, 0);
    assert_eq!(h.completer.calls(), 0);
    assert_eq!(h.session.transcript().len(), 4);
}

// ── Collaborator failures ────────────────────────────────────────────────────

#[tokio::test]
async fn moderation_failure_appends_only_apology() {
    let mut h = harness(
        ModerationMode::Fail,
        FakeCompleter::replies([QUESTION]),
        SessionSettings::default(),
    );

    let report = h.session.submit_user_turn("hello").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Failed);
    assert_eq!(report.appended, vec![Message::assistant(CONTACT_FAILURE)]);
    assert_eq!(h.completer.calls(), 0);
    assert_eq!(h.session.questions_asked(), 0);
}

#[tokio::test]
async fn completion_failure_keeps_user_turn() {
    let mut h = allow(FakeCompleter::new(vec![Scripted::Fail]));

    let report = h.session.submit_user_turn("hello").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Failed);
    assert_eq!(
        report.appended,
        vec![Message::user("hello"), Message::assistant(CONTACT_FAILURE)]
    );
    assert_eq!(report.questions_asked, 0);
    assert_eq!(report.disposition, Disposition::Questioning);
}

#[tokio::test]
async fn slow_completion_times_out() {
    let mut h = harness(
        ModerationMode::Allow,
        FakeCompleter::new(vec![Scripted::Stall, Scripted::Reply(QUESTION.to_string())]),
        SessionSettings {
            request_timeout: Duration::from_millis(50),
            ..SessionSettings::default()
        },
    );

    let report = h.session.submit_user_turn("hello").await.unwrap();
    assert_eq!(report.outcome, TurnOutcome::Failed);
    assert_eq!(report.appended[1], Message::assistant(TIMEOUT_FAILURE));

    // The session stays usable.
    let report = h.session.submit_user_turn("hello again").await.unwrap();
    assert_eq!(report.outcome, TurnOutcome::Replied);
    assert_eq!(report.questions_asked, 1);
}

// ── Diagnosis ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn diagnostic_reply_is_marked_and_extracted() {
    let mut h = allow(FakeCompleter::replies([QUESTION, DIAGNOSIS]));

    h.session.submit_user_turn("It just dies").await.unwrap();
    let report = h.session.submit_user_turn("Only on battery").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Diagnosed);
    assert_eq!(report.disposition, Disposition::Diagnosed);
    assert_eq!(report.questions_asked, 1);
    assert_eq!(
        report.appended[1].text,
        "Thanks, Dana. I have a few ideas of what's going on! Here is your Free Diagnosis:\n- Worn battery\n- Overheating\n"
    );

    let titles: Vec<_> = h
        .session
        .possible_problems()
        .iter()
        .map(|p| p.title.as_str())
        .collect();
    assert_eq!(titles, ["Worn battery", "Overheating"]);
}

#[tokio::test]
async fn existing_free_diagnosis_mention_is_kept() {
    let reply = "I have a few ideas of whats going on. This is your FREE DIAGNOSIS.\n- Dust";
    let mut h = allow(FakeCompleter::replies([reply]));

    let report = h.session.submit_user_turn("hello").await.unwrap();

    assert_eq!(report.appended[1].text, reply);
}

#[tokio::test]
async fn fallback_extraction_through_session() {
    let mut h = allow(FakeCompleter::replies([
        "I have a few ideas of whats going on. Could be the battery. Could be the charger.",
    ]));

    h.session.submit_user_turn("hello").await.unwrap();

    let titles: Vec<_> = h
        .session
        .possible_problems()
        .iter()
        .map(|p| p.title.as_str())
        .collect();
    assert_eq!(titles, ["Could be the battery", "Could be the charger"]);
}

#[tokio::test]
async fn diagnosis_emits_one_event() {
    let mut h = allow(FakeCompleter::replies([
        DIAGNOSIS,
        QUESTION,
        "I have a few ideas of whats going on:\n- Loose cable",
    ]));

    h.session.submit_user_turn("one").await.unwrap();
    let event = h.events.try_recv().expect("event on first diagnosis");
    assert_eq!(event.record.session_id, h.session.id());
    assert_eq!(event.record.conversation, h.session.transcript());
    assert_eq!(event.record.possible_problems.len(), 2);
    assert!(event.user_id.is_some());

    h.session.submit_user_turn("two").await.unwrap();
    h.session.submit_user_turn("three").await.unwrap();

    assert!(h.events.try_recv().is_err());
    assert_eq!(h.session.possible_problems().len(), 1);
    assert_eq!(h.session.possible_problems()[0].title, "Loose cable");
}

// ── Cutoff ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tenth_question_cuts_off() {
    let mut h = allow(FakeCompleter::replies(vec![QUESTION; 10]));

    for turn in 1..10 {
        let report = h.session.submit_user_turn("more detail").await.unwrap();
        assert_eq!(report.outcome, TurnOutcome::Replied, "turn {turn}");
    }
    let report = h.session.submit_user_turn("more detail").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::CutOff);
    assert_eq!(report.questions_asked, 10);
    assert_eq!(report.disposition, Disposition::CutOff);
    assert_eq!(
        report.appended.last(),
        Some(&Message::assistant(CUTOFF_NOTICE))
    );
    assert!(h.session.cutoff_reached());

    let len = h.session.transcript().len();
    let err = h.session.submit_user_turn("anything else?").await.unwrap_err();
    assert!(matches!(err, DiagnosisError::CutoffReached));
    assert_eq!(h.session.transcript().len(), len);
    assert_eq!(h.moderator.calls(), 10);
    assert_eq!(h.completer.calls(), 10);
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn diagnosed_session_never_cuts_off() {
    let mut script = vec![DIAGNOSIS];
    script.extend([QUESTION; 5]);
    let mut h = harness(
        ModerationMode::Allow,
        FakeCompleter::replies(script),
        SessionSettings {
            max_questions: 3,
            ..SessionSettings::default()
        },
    );

    h.session.submit_user_turn("start").await.unwrap();
    for _ in 0..5 {
        let report = h.session.submit_user_turn("follow up").await.unwrap();
        assert_eq!(report.outcome, TurnOutcome::Replied);
        assert_eq!(report.disposition, Disposition::Diagnosed);
    }

    assert_eq!(h.session.questions_asked(), 5);
    assert!(!h.session.cutoff_reached());
}

// ── Snapshot ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_serializes_disposition() {
    let mut h = allow(FakeCompleter::replies([DIAGNOSIS]));
    h.session.submit_user_turn("hello").await.unwrap();

    let json = serde_json::to_value(h.session.snapshot()).unwrap();

    assert_eq!(json["disposition"], "diagnosed");
    assert_eq!(json["diagnosis_reached"], true);
    assert_eq!(json["transcript"].as_array().unwrap().len(), 5);
    assert_eq!(json["possible_problems"][0]["title"], "Worn battery");
}
