use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use nerdherd_core::models::diagnosis::DiagnosisRecord;
use nerdherd_core::models::repair_request::RepairRequest;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_repair_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<RepairRequest>>, ApiError> {
    Ok(Json(state.store.list_repair_requests().await?))
}

pub async fn get_repair_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RepairRequest>, ApiError> {
    Ok(Json(state.store.get_repair_request(id).await?))
}

pub async fn delete_repair_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_repair_request(id).await?;
    tracing::info!(repair_request_id = %id, "lead deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_diagnoses(
    State(state): State<AppState>,
) -> Result<Json<Vec<DiagnosisRecord>>, ApiError> {
    Ok(Json(state.store.list_diagnoses().await?))
}
