use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;

use crate::dto::common_dto::{ApiResponse, LimitQuery};
use crate::dto::engagement_dto::{LogCallRequest, NoteRequest, QualificationResponse, QualifyLeadRequest};
use crate::dto::lead_dto::{
    CreateLeadRequest, CreateLeadResponse, InboundMessageRequest, LeadDetailResponse, LeadListResponse,
    ReassignRequest, ReassignResponse, UpdateStageRequest,
};
use crate::models::activity::Activity;
use crate::models::auth::Identity;
use crate::models::call_log::CallLog;
use crate::models::lead::{Lead, LeadFilters};
use crate::models::note::Note;
use crate::models::qualification::Qualification;
use crate::models::sla::SlaEvaluation;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiJson, ApiQuery};

pub fn create_lead_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route("/reassign", post(reassign_leads))
        .route("/:id", get(get_lead).delete(delete_lead))
        .route("/:id/stage", patch(update_stage))
        .route("/:id/inbound", post(record_inbound_message))
        .route("/:id/sla", get(get_lead_sla))
        .route("/:id/notes", get(list_notes).post(add_note))
        .route("/:id/calls", get(list_calls).post(log_call))
        .route("/:id/activities", get(list_lead_activities))
        .route("/:id/qualifications", get(list_qualifications).post(qualify_lead))
}

async fn list_leads(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiQuery(filters): ApiQuery<LeadFilters>,
) -> Result<Json<ApiResponse<LeadListResponse>>, AppError> {
    let leads = state.lead_service().scope_leads_for(&identity, &filters).await?;
    Ok(Json(ApiResponse::success(LeadListResponse {
        count: leads.len(),
        leads,
    })))
}

/// 201 si se creó, 200 si se devolvió un lead existente
async fn create_lead(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<CreateLeadRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateLeadResponse>>), AppError> {
    let response = state.lead_service().create_lead(&identity, request).await?;

    if response.created {
        Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success_with_message(response, "Lead created")),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(ApiResponse::success_with_message(response, "Lead already exists")),
        ))
    }
}

async fn get_lead(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LeadDetailResponse>>, AppError> {
    let detail = state.lead_service().get_lead_detail(&identity, id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(detail)))
}

async fn delete_lead(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.lead_service().delete_lead(&identity, id).await?;
    Ok(Json(ApiResponse::message("Lead deleted")))
}

async fn update_stage(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateStageRequest>,
) -> Result<Json<ApiResponse<Lead>>, AppError> {
    let lead = state
        .lead_service()
        .update_stage(&identity, id, &request.stage)
        .await?;
    Ok(Json(ApiResponse::success(lead)))
}

async fn reassign_leads(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<ReassignRequest>,
) -> Result<Json<ApiResponse<ReassignResponse>>, AppError> {
    let response = state.assignment_service().reassign(&identity, request).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn record_inbound_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    request: Option<Json<InboundMessageRequest>>,
) -> Result<Json<ApiResponse<Lead>>, AppError> {
    let received_at = request.and_then(|Json(body)| body.received_at);
    let lead = state
        .lead_service()
        .record_inbound_message(&identity, id, received_at)
        .await?;
    Ok(Json(ApiResponse::success(lead)))
}

async fn get_lead_sla(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SlaEvaluation>>, AppError> {
    let evaluation = state.sla_service().lead_sla(&identity, id, Utc::now()).await?;
    Ok(Json(ApiResponse::success(evaluation)))
}

async fn list_notes(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Note>>>, AppError> {
    let notes = state.engagement_service().list_notes(&identity, id).await?;
    Ok(Json(ApiResponse::success(notes)))
}

async fn add_note(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<NoteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Note>>), AppError> {
    let note = state.engagement_service().add_note(&identity, id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(note))))
}

async fn list_calls(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CallLog>>>, AppError> {
    let calls = state.engagement_service().list_calls(&identity, id).await?;
    Ok(Json(ApiResponse::success(calls)))
}

async fn log_call(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<LogCallRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CallLog>>), AppError> {
    let call = state.engagement_service().log_call(&identity, id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(call))))
}

async fn list_lead_activities(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Activity>>>, AppError> {
    let activities = state
        .activity_service()
        .lead_activities(&identity, id, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(activities)))
}

async fn list_qualifications(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Qualification>>>, AppError> {
    let history = state.engagement_service().list_qualifications(&identity, id).await?;
    Ok(Json(ApiResponse::success(history)))
}

async fn qualify_lead(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<QualifyLeadRequest>,
) -> Result<(StatusCode, Json<ApiResponse<QualificationResponse>>), AppError> {
    let response = state.engagement_service().qualify_lead(&identity, id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}
