use async_trait::async_trait;
use chrono::Utc;

use super::activity_repository::insert_activity;
use super::{EngagementRepository, PgStore};
use crate::models::activity::{ActivityType, NewActivity};
use crate::models::call_log::{CallLog, NewCallLog};
use crate::models::lead::Lead;
use crate::models::note::Note;
use crate::models::qualification::{Qualification, QualificationCategory};
use crate::utils::errors::AppResult;

#[async_trait]
impl EngagementRepository for PgStore {
    async fn add_note(&self, lead_id: i64, author_id: i64, content: String) -> AppResult<Note> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (lead_id, author_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(author_id)
        .bind(content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut *tx, &NewActivity::note(&note, ActivityType::NoteAdded)).await?;
        tx.commit().await?;

        Ok(note)
    }

    async fn find_note(&self, id: i64) -> AppResult<Option<Note>> {
        let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(note)
    }

    async fn update_note(&self, id: i64, content: String) -> AppResult<Option<Note>> {
        let mut tx = self.pool.begin().await?;

        let note = sqlx::query_as::<_, Note>(
            "UPDATE notes SET content = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(content)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(note) = note else {
            return Ok(None);
        };

        insert_activity(&mut *tx, &NewActivity::note(&note, ActivityType::NoteUpdated)).await?;
        tx.commit().await?;

        Ok(Some(note))
    }

    async fn delete_note(&self, id: i64) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let note = sqlx::query_as::<_, Note>("DELETE FROM notes WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(note) = note else {
            return Ok(false);
        };

        insert_activity(&mut *tx, &NewActivity::note(&note, ActivityType::NoteDeleted)).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn list_notes(&self, lead_id: i64) -> AppResult<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            "SELECT * FROM notes WHERE lead_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    async fn log_call(&self, call: NewCallLog) -> AppResult<CallLog> {
        let mut tx = self.pool.begin().await?;

        let logged = sqlx::query_as::<_, CallLog>(
            r#"
            INSERT INTO call_logs (lead_id, user_id, duration_seconds, outcome, notes, called_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(call.lead_id)
        .bind(call.user_id)
        .bind(call.duration_seconds)
        .bind(&call.outcome)
        .bind(&call.notes)
        .bind(call.called_at)
        .fetch_one(&mut *tx)
        .await?;

        // La llamada responde al mensaje pendiente: el reloj vuelve a updated_at
        sqlx::query("UPDATE leads SET last_inbound_message_at = NULL, updated_at = $2 WHERE id = $1")
            .bind(call.lead_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        insert_activity(&mut *tx, &NewActivity::call_logged(&logged)).await?;
        tx.commit().await?;

        Ok(logged)
    }

    async fn list_calls(&self, lead_id: i64) -> AppResult<Vec<CallLog>> {
        let calls = sqlx::query_as::<_, CallLog>(
            "SELECT * FROM call_logs WHERE lead_id = $1 ORDER BY called_at DESC, id DESC",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(calls)
    }

    async fn record_qualification(
        &self,
        lead_id: i64,
        score: i32,
        category: QualificationCategory,
        summary: Option<String>,
        actor_id: i64,
    ) -> AppResult<Option<(Qualification, Lead)>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let lead = sqlx::query_as::<_, Lead>(
            "UPDATE leads SET score = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(lead_id)
        .bind(score)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(lead) = lead else {
            return Ok(None);
        };

        let qualification = sqlx::query_as::<_, Qualification>(
            r#"
            INSERT INTO lead_qualifications (lead_id, score, category, summary, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(lead_id)
        .bind(score)
        .bind(category)
        .bind(summary)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut *tx, &NewActivity::lead_qualified(&qualification, actor_id)).await?;
        tx.commit().await?;

        Ok(Some((qualification, lead)))
    }

    async fn list_qualifications(&self, lead_id: i64) -> AppResult<Vec<Qualification>> {
        let qualifications = sqlx::query_as::<_, Qualification>(
            "SELECT * FROM lead_qualifications WHERE lead_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(qualifications)
    }
}
