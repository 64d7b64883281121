use axum::Json;
use axum::extract::State;

use nerdherd_core::models::intake::IntakeProfile;
use nerdherd_core::models::user::UserRecord;
use nerdherd_diagnosis::session::{DiagnosisSession, SessionSnapshot};

use crate::error::ApiError;
use crate::state::AppState;

/// Store the intake profile and open a diagnosis session for it.
pub async fn start_intake(
    State(state): State<AppState>,
    Json(profile): Json<IntakeProfile>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    profile.validate()?;

    let user = UserRecord::new(profile.clone());
    state.store.save_user(&user).await?;

    let session = DiagnosisSession::start(
        profile,
        Some(user.id),
        state.collaborators.clone(),
        state.settings,
        state.events.clone(),
    )?;
    let snapshot = session.snapshot();
    state.insert_session(session).await;

    Ok(Json(snapshot))
}
