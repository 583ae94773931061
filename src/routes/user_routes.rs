use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::dto::common_dto::ApiResponse;
use crate::dto::user_dto::{AddTeamMemberRequest, CreateTeamRequest, CreateUserRequest};
use crate::models::auth::Identity;
use crate::models::user::{TeamResponse, UserResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::ApiJson;

pub fn create_user_router() -> Router<AppState> {
    Router::new().route("/", get(list_users).post(create_user))
}

pub fn create_team_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_team))
        .route("/:id", get(get_team))
        .route("/:id/members", post(add_team_member))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let users = state.user_service().list_users(&identity).await?;
    Ok(Json(ApiResponse::success(users)))
}

async fn create_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), AppError> {
    let user = state.user_service().create_user(&identity, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(user, "User created")),
    ))
}

async fn create_team(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TeamResponse>>), AppError> {
    let team = state.user_service().create_team(&identity, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(team))))
}

async fn get_team(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<TeamResponse>>, AppError> {
    let team = state.user_service().get_team(&identity, id).await?;
    Ok(Json(ApiResponse::success(team)))
}

async fn add_team_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<AddTeamMemberRequest>,
) -> Result<Json<ApiResponse<TeamResponse>>, AppError> {
    let team = state.user_service().add_team_member(&identity, id, request).await?;
    Ok(Json(ApiResponse::success(team)))
}
