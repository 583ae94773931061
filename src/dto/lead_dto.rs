use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::lead::Lead;
use crate::models::sla::SlaEvaluation;
use crate::utils::validation::PHONE_REGEX;

// Request para crear un lead
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(regex = "PHONE_REGEX")]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    pub source: Option<String>,
    #[validate(length(max = 200))]
    pub program: Option<String>,
    #[validate(length(max = 100))]
    pub intake: Option<String>,
    pub budget: Option<Decimal>,
    pub stage: Option<String>,
    pub assigned_to_id: Option<i64>,
}

// Request para cambiar la etapa
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStageRequest {
    pub stage: String,
}

// Request de reasignación masiva
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignRequest {
    pub lead_ids: Vec<i64>,
    pub assigned_to_id: i64,
}

// Mensaje entrante desde un canal (inbox)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessageRequest {
    pub received_at: Option<DateTime<Utc>>,
}

// Resultado de creación: `created = false` cuando se devolvió un lead existente
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadResponse {
    pub lead: Lead,
    pub created: bool,
}

// Lead con su estado de SLA calculado al leer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetailResponse {
    pub lead: Lead,
    pub sla: SlaEvaluation,
}

// Listado de leads
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadListResponse {
    pub leads: Vec<Lead>,
    pub count: usize,
}

// Resultado de una reasignación
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignResponse {
    pub assigned_to_id: i64,
    pub leads: Vec<Lead>,
}
