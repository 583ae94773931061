//! Rutas HTTP
//!
//! `/health` y `/api/auth/login` son públicas. El resto pasa por el
//! middleware de autenticación.

pub mod activity_routes;
pub mod auth_routes;
pub mod dashboard_routes;
pub mod lead_routes;
pub mod note_routes;
pub mod sla_routes;
pub mod user_routes;

use axum::{middleware::from_fn_with_state, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{auth_middleware, cors_layer};
use crate::state::AppState;

/// Construye el router completo de la API
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/auth", auth_routes::create_session_router())
        .nest("/api/leads", lead_routes::create_lead_router())
        .nest("/api/notes", note_routes::create_note_router())
        .nest("/api/activities", activity_routes::create_activity_router())
        .nest("/api/sla", sla_routes::create_sla_router())
        .nest("/api/dashboard", dashboard_routes::create_dashboard_router())
        .nest("/api/users", user_routes::create_user_router())
        .nest("/api/teams", user_routes::create_team_router())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes::create_auth_router())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
