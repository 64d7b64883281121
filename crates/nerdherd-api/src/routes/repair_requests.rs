use axum::Json;
use axum::extract::State;

use nerdherd_core::models::repair_request::{RepairRequest, RepairRequestForm};

use crate::error::ApiError;
use crate::state::AppState;

/// Public booking form submission.
pub async fn create_repair_request(
    State(state): State<AppState>,
    Json(form): Json<RepairRequestForm>,
) -> Result<Json<RepairRequest>, ApiError> {
    let request = RepairRequest::from_form(form)?;
    state.store.save_repair_request(&request).await?;
    Ok(Json(request))
}
