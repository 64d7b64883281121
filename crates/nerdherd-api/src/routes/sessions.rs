use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use nerdherd_diagnosis::session::{SessionSnapshot, TurnReport};

use crate::error::ApiError;
use crate::state::{AppState, SessionHandle};

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

async fn find(state: &AppState, id: Uuid) -> Result<SessionHandle, ApiError> {
    state
        .session(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("session not found: {id}")))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = find(&state, id).await?;
    let session = handle.lock().await;
    Ok(Json(session.snapshot()))
}

/// Run one user turn. A second submission while a turn is running is
/// rejected rather than queued.
pub async fn submit_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnReport>, ApiError> {
    let handle = find(&state, id).await?;
    let mut session = handle
        .try_lock()
        .map_err(|_| ApiError::Conflict("a message is already being processed".to_string()))?;

    let report = session.submit_user_turn(&req.text).await?;
    Ok(Json(report))
}
