use axum::{
    extract::{Path, State},
    routing::put,
    Extension, Json, Router,
};

use crate::dto::common_dto::ApiResponse;
use crate::dto::engagement_dto::NoteRequest;
use crate::models::auth::Identity;
use crate::models::note::Note;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::ApiJson;

/// Edición y borrado de notas. Solo el autor puede modificarlas.
pub fn create_note_router() -> Router<AppState> {
    Router::new().route("/:id", put(update_note).delete(delete_note))
}

async fn update_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<NoteRequest>,
) -> Result<Json<ApiResponse<Note>>, AppError> {
    let note = state.engagement_service().update_note(&identity, id, request).await?;
    Ok(Json(ApiResponse::success(note)))
}

async fn delete_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.engagement_service().delete_note(&identity, id).await?;
    Ok(Json(ApiResponse::message("Note deleted")))
}
