use axum::{extract::State, routing::{get, post}, Extension, Json, Router};

use crate::dto::auth_dto::{LoginRequest, LoginResponse, MeResponse};
use crate::dto::common_dto::ApiResponse;
use crate::models::auth::Identity;
use crate::services::AuthService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::ApiJson;

/// Rutas públicas de autenticación
pub fn create_auth_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Rutas de autenticación que requieren token
pub fn create_session_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let response = state.auth_service().login(request).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Login successful")))
}

async fn me(Extension(identity): Extension<Identity>) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::success(AuthService::me(identity)))
}
