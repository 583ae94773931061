use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};

use crate::dto::common_dto::{ApiResponse, LimitQuery};
use crate::models::activity::Activity;
use crate::models::auth::Identity;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::ApiQuery;

pub fn create_activity_router() -> Router<AppState> {
    Router::new().route("/", get(activity_feed))
}

async fn activity_feed(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Activity>>>, AppError> {
    let activities = state.activity_service().feed(&identity, query.limit).await?;
    Ok(Json(ApiResponse::success(activities)))
}
