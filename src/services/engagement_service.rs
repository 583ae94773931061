//! Notas, registro de llamadas y calificación de leads

use chrono::Utc;
use validator::{Validate, ValidationErrors};

use crate::dto::engagement_dto::{LogCallRequest, NoteRequest, QualificationResponse, QualifyLeadRequest};
use crate::models::auth::{Identity, Role};
use crate::models::call_log::{CallLog, NewCallLog};
use crate::models::note::Note;
use crate::models::qualification::{Qualification, QualificationCategory};
use crate::repositories::{EngagementRepository, SharedStore};
use crate::services::access_service::ensure_role;
use crate::services::lead_service::find_accessible_lead;
use crate::utils::errors::{forbidden_error, not_found_error, AppResult};
use crate::utils::validation::{into_result, normalize_optional, validate_not_blank};

/// Servicio de seguimiento
pub struct EngagementService {
    store: SharedStore,
}

impl EngagementService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    fn validate_note(request: &NoteRequest) -> AppResult<()> {
        let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);
        if let Err(e) = validate_not_blank(&request.content) {
            errors.add("content", e);
        }
        into_result(errors)?;
        Ok(())
    }

    /// Nota del autor. Cualquier otro usuario recibe `Forbidden`.
    async fn authored_note(&self, identity: &Identity, note_id: i64, operation: &str) -> AppResult<Note> {
        ensure_role(identity, &Role::ALL, operation)?;

        let note = self
            .store
            .find_note(note_id)
            .await?
            .ok_or_else(|| not_found_error("Note", note_id))?;

        if note.author_id != identity.id {
            return Err(forbidden_error(operation, "only the author can modify a note"));
        }

        Ok(note)
    }

    pub async fn add_note(&self, identity: &Identity, lead_id: i64, request: NoteRequest) -> AppResult<Note> {
        Self::validate_note(&request)?;
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "add note").await?;

        let note = self
            .store
            .add_note(lead.id, identity.id, request.content.trim().to_string())
            .await?;
        tracing::debug!("Note {} added to lead {} by user {}", note.id, lead.id, identity.id);

        Ok(note)
    }

    pub async fn list_notes(&self, identity: &Identity, lead_id: i64) -> AppResult<Vec<Note>> {
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "list notes").await?;
        self.store.list_notes(lead.id).await
    }

    pub async fn update_note(&self, identity: &Identity, note_id: i64, request: NoteRequest) -> AppResult<Note> {
        Self::validate_note(&request)?;
        let note = self.authored_note(identity, note_id, "edit note").await?;

        self.store
            .update_note(note.id, request.content.trim().to_string())
            .await?
            .ok_or_else(|| not_found_error("Note", note_id))
    }

    pub async fn delete_note(&self, identity: &Identity, note_id: i64) -> AppResult<()> {
        let note = self.authored_note(identity, note_id, "delete note").await?;

        if !self.store.delete_note(note.id).await? {
            return Err(not_found_error("Note", note_id));
        }

        Ok(())
    }

    /// Registra una llamada. Cuenta como respuesta y reinicia el reloj de SLA.
    pub async fn log_call(&self, identity: &Identity, lead_id: i64, request: LogCallRequest) -> AppResult<CallLog> {
        request.validate()?;
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "log call").await?;

        let call = self
            .store
            .log_call(NewCallLog {
                lead_id: lead.id,
                user_id: identity.id,
                duration_seconds: request.duration,
                outcome: request.outcome.trim().to_string(),
                notes: normalize_optional(request.notes),
                called_at: request.called_at.unwrap_or_else(Utc::now),
            })
            .await?;

        tracing::info!(
            "Call {} logged on lead {} by user {} ({}s, {})",
            call.id,
            lead.id,
            identity.id,
            call.duration_seconds,
            call.outcome
        );

        Ok(call)
    }

    pub async fn list_calls(&self, identity: &Identity, lead_id: i64) -> AppResult<Vec<CallLog>> {
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "list calls").await?;
        self.store.list_calls(lead.id).await
    }

    /// Guarda el resultado del calificador y refleja el score en el lead
    pub async fn qualify_lead(
        &self,
        identity: &Identity,
        lead_id: i64,
        request: QualifyLeadRequest,
    ) -> AppResult<QualificationResponse> {
        request.validate()?;
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "qualify lead").await?;

        let category = QualificationCategory::from_score(request.score);
        let (qualification, lead) = self
            .store
            .record_qualification(
                lead.id,
                request.score,
                category,
                normalize_optional(request.summary),
                identity.id,
            )
            .await?
            .ok_or_else(|| not_found_error("Lead", lead_id))?;

        tracing::info!(
            "Lead {} qualified as {:?} (score {})",
            lead.id,
            qualification.category,
            qualification.score
        );

        Ok(QualificationResponse { qualification, lead })
    }

    pub async fn list_qualifications(&self, identity: &Identity, lead_id: i64) -> AppResult<Vec<Qualification>> {
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "list qualifications").await?;
        self.store.list_qualifications(lead.id).await
    }
}
