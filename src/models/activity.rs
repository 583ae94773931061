//! Registro de auditoría (append-only)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, Type};

use super::call_log::CallLog;
use super::lead::{Lead, Stage};
use super::note::Note;
use super::qualification::Qualification;
use super::sla::SlaConfig;

/// Tipo de acción registrada - mapea al ENUM activity_type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "activity_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    LeadCreated,
    StageChanged,
    Reassigned,
    LeadDeleted,
    NoteAdded,
    NoteUpdated,
    NoteDeleted,
    CallLogged,
    InboundMessage,
    LeadQualified,
    SlaConfigUpdated,
    UserCreated,
    TeamUpdated,
}

impl ActivityType {
    /// Módulo funcional al que pertenece la acción
    pub fn module(&self) -> &'static str {
        match self {
            ActivityType::LeadCreated
            | ActivityType::StageChanged
            | ActivityType::Reassigned
            | ActivityType::LeadDeleted
            | ActivityType::LeadQualified => "leads",
            ActivityType::NoteAdded | ActivityType::NoteUpdated | ActivityType::NoteDeleted => "notes",
            ActivityType::CallLogged => "calls",
            ActivityType::InboundMessage => "inbox",
            ActivityType::SlaConfigUpdated => "settings",
            ActivityType::UserCreated | ActivityType::TeamUpdated => "users",
        }
    }
}

/// Activity - mapea a la tabla activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub lead_id: Option<i64>,
    pub user_id: i64,
    pub action: ActivityType,
    pub module: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Entrada de auditoría pendiente de persistir
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub lead_id: Option<i64>,
    pub user_id: i64,
    pub action: ActivityType,
    pub details: serde_json::Value,
}

impl NewActivity {
    pub fn for_lead(lead_id: i64, user_id: i64, action: ActivityType, details: serde_json::Value) -> Self {
        Self {
            lead_id: Some(lead_id),
            user_id,
            action,
            details,
        }
    }

    pub fn general(user_id: i64, action: ActivityType, details: serde_json::Value) -> Self {
        Self {
            lead_id: None,
            user_id,
            action,
            details,
        }
    }

    pub fn lead_created(lead: &Lead, actor_id: i64) -> Self {
        Self::for_lead(
            lead.id,
            actor_id,
            ActivityType::LeadCreated,
            json!({
                "name": lead.name,
                "stage": lead.stage,
                "source": lead.source,
                "assignedToId": lead.assigned_to_id,
            }),
        )
    }

    pub fn stage_changed(lead_id: i64, actor_id: i64, from: Stage, to: Stage) -> Self {
        Self::for_lead(
            lead_id,
            actor_id,
            ActivityType::StageChanged,
            json!({ "from": from, "to": to }),
        )
    }

    pub fn reassigned(lead_id: i64, actor_id: i64, from: Option<i64>, to: i64) -> Self {
        Self::for_lead(
            lead_id,
            actor_id,
            ActivityType::Reassigned,
            json!({ "from": from, "to": to, "actor": actor_id }),
        )
    }

    /// El lead ya no existe: la referencia queda en los detalles
    pub fn lead_deleted(lead: &Lead, actor_id: i64) -> Self {
        Self::general(
            actor_id,
            ActivityType::LeadDeleted,
            json!({ "leadId": lead.id, "name": lead.name }),
        )
    }

    pub fn note(note: &Note, action: ActivityType) -> Self {
        Self::for_lead(note.lead_id, note.author_id, action, json!({ "noteId": note.id }))
    }

    pub fn call_logged(call: &CallLog) -> Self {
        Self::for_lead(
            call.lead_id,
            call.user_id,
            ActivityType::CallLogged,
            json!({
                "callId": call.id,
                "duration": call.duration_seconds,
                "outcome": call.outcome,
            }),
        )
    }

    pub fn inbound_message(lead_id: i64, actor_id: i64, received_at: DateTime<Utc>) -> Self {
        Self::for_lead(
            lead_id,
            actor_id,
            ActivityType::InboundMessage,
            json!({ "receivedAt": received_at }),
        )
    }

    pub fn lead_qualified(qualification: &Qualification, actor_id: i64) -> Self {
        Self::for_lead(
            qualification.lead_id,
            actor_id,
            ActivityType::LeadQualified,
            json!({
                "score": qualification.score,
                "category": qualification.category,
            }),
        )
    }

    pub fn user_created(user_id: i64, role: &str, actor_id: i64) -> Self {
        Self::general(
            actor_id,
            ActivityType::UserCreated,
            json!({ "userId": user_id, "role": role }),
        )
    }

    pub fn team_updated(team_id: i64, actor_id: i64, details: serde_json::Value) -> Self {
        let mut details = details;
        if let Some(map) = details.as_object_mut() {
            map.insert("teamId".to_string(), json!(team_id));
        }
        Self::general(actor_id, ActivityType::TeamUpdated, details)
    }

    pub fn sla_config_updated(config: &SlaConfig, actor_id: i64) -> Self {
        Self::general(
            actor_id,
            ActivityType::SlaConfigUpdated,
            json!({
                "responseMinutes": config.response_minutes,
                "escalateMinutes": config.escalate_minutes,
            }),
        )
    }
}

/// Filtro del feed de actividad
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub lead_id: Option<i64>,
    /// `None` = sin restricción por autor
    pub user_ids: Option<Vec<i64>>,
    pub limit: i64,
}
