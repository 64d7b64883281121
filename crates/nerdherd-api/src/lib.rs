//! nerdherd-api
//!
//! HTTP surface for the NerdHerd diagnosis service: repair bookings, intake,
//! the diagnosis chat, and the admin lead views.

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

pub mod aws;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use state::AppState;

/// Assemble the full router around a prepared state.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route(
            "/repair-requests",
            get(routes::admin::list_repair_requests),
        )
        .route(
            "/repair-requests/{id}",
            get(routes::admin::get_repair_request).delete(routes::admin::delete_repair_request),
        )
        .route("/diagnoses", get(routes::admin::list_diagnoses))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::admin_auth::require_admin,
        ));

    Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health_check))
        // Public forms
        .route(
            "/repair-requests",
            post(routes::repair_requests::create_repair_request),
        )
        .route("/intake", post(routes::intake::start_intake))
        // Diagnosis chat
        .route("/sessions/{id}", get(routes::sessions::get_session))
        .route("/sessions/{id}/turns", post(routes::sessions::submit_turn))
        .nest("/admin", admin)
        .layer(axum_mw::from_fn(middleware::request_log::log_request))
        .layer(cors)
        .with_state(state)
}
