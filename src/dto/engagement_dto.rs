//! DTOs de notas, llamadas y calificación

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::lead::Lead;
use crate::models::qualification::Qualification;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogCallRequest {
    /// Duración en segundos
    #[validate(range(min = 0, max = 86400))]
    pub duration: i32,
    #[validate(length(min = 1, max = 100))]
    pub outcome: String,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub called_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QualifyLeadRequest {
    #[validate(range(min = 0, max = 100))]
    pub score: i32,
    #[validate(length(max = 2000))]
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationResponse {
    pub qualification: Qualification,
    pub lead: Lead,
}
