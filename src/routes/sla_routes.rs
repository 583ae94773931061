use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;

use crate::dto::common_dto::{ApiResponse, LimitQuery};
use crate::dto::sla_dto::{SlaBreachListResponse, UpdateSlaConfigRequest};
use crate::models::auth::Identity;
use crate::models::sla::SlaConfig;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiJson, ApiQuery};

pub fn create_sla_router() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_config).put(update_config))
        .route("/breaches", get(list_breaches))
}

async fn get_config(State(state): State<AppState>) -> Result<Json<ApiResponse<SlaConfig>>, AppError> {
    let config = state.sla_service().config().await?;
    Ok(Json(ApiResponse::success(config)))
}

async fn update_config(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<UpdateSlaConfigRequest>,
) -> Result<Json<ApiResponse<SlaConfig>>, AppError> {
    let config = state.sla_service().update_config(&identity, request).await?;
    Ok(Json(ApiResponse::success_with_message(config, "SLA configuration updated")))
}

/// Leads en WARNING o BREACHED, el más atrasado primero
async fn list_breaches(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<ApiResponse<SlaBreachListResponse>>, AppError> {
    let limit = query.limit.map(|limit| limit.max(0) as usize);
    let response = state.sla_service().breaches(&identity, Utc::now(), limit).await?;
    Ok(Json(ApiResponse::success(response)))
}
