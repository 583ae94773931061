use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::Utc;

use crate::dto::common_dto::ApiResponse;
use crate::dto::dashboard_dto::DashboardSummary;
use crate::models::auth::Identity;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/summary", get(summary))
}

async fn summary(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<DashboardSummary>>, AppError> {
    let summary = state.dashboard_service().summary(&identity, Utc::now()).await?;
    Ok(Json(ApiResponse::success(summary)))
}
