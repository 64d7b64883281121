//! Fire-and-forget persistence of finished diagnoses.
//!
//! Sessions push a [`DiagnosisEvent`] onto an unbounded channel and carry on.
//! A single worker task drains the channel, so storage latency and storage
//! failures never reach the conversation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use nerdherd_core::models::diagnosis::DiagnosisRecord;

use crate::collaborators::DiagnosisStore;

/// A diagnosis ready to be stored.
#[derive(Debug, Clone)]
pub struct DiagnosisEvent {
    /// Intake record to append the diagnosis to, when the session has one.
    pub user_id: Option<Uuid>,
    pub record: DiagnosisRecord,
}

/// Start the worker on the current runtime.
///
/// The worker exits once every sender has been dropped and the queue is empty.
pub fn spawn_persistence_worker(
    store: Arc<dyn DiagnosisStore>,
) -> (mpsc::UnboundedSender<DiagnosisEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_persistence_worker(store, rx));
    (tx, handle)
}

pub async fn run_persistence_worker(
    store: Arc<dyn DiagnosisStore>,
    mut events: mpsc::UnboundedReceiver<DiagnosisEvent>,
) {
    while let Some(event) = events.recv().await {
        persist(store.as_ref(), &event).await;
    }
    info!("persistence worker stopped");
}

async fn persist(store: &dyn DiagnosisStore, event: &DiagnosisEvent) {
    let record = &event.record;

    if let Err(e) = store.save_diagnosis(record).await {
        warn!(
            diagnosis_id = %record.id,
            session_id = %record.session_id,
            error = %e,
            "failed to save diagnosis"
        );
        return;
    }
    info!(diagnosis_id = %record.id, session_id = %record.session_id, "diagnosis saved");

    let Some(user_id) = event.user_id else {
        return;
    };

    match store.append_diagnosis_to_user(user_id, record).await {
        Ok(()) => info!(diagnosis_id = %record.id, %user_id, "diagnosis appended to user"),
        Err(e) => warn!(
            diagnosis_id = %record.id,
            %user_id,
            error = %e,
            "failed to append diagnosis to user"
        ),
    }
}
