use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use super::activity_repository::insert_activity;
use super::{missing_ids, order_by_ids, InsertedLead, LeadRepository, PgStore, Reassignment, StageChange};
use crate::models::activity::NewActivity;
use crate::models::lead::{Lead, LeadFilters, LeadSource, NewLead, Stage};
use crate::services::access_service::LeadScope;
use crate::utils::errors::{AppError, AppResult};

#[async_trait]
impl LeadRepository for PgStore {
    async fn insert_lead(&self, lead: NewLead, actor_id: i64) -> AppResult<InsertedLead> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // El índice único parcial (phone, source) resuelve reintentos concurrentes
        let created = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                name, phone, email, country, source, program, intake, budget,
                stage, assigned_to_id, created_by_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            ON CONFLICT (phone, source) WHERE phone IS NOT NULL AND source IS NOT NULL
            DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&lead.name)
        .bind(&lead.phone)
        .bind(&lead.email)
        .bind(&lead.country)
        .bind(lead.source)
        .bind(&lead.program)
        .bind(&lead.intake)
        .bind(lead.budget)
        .bind(lead.stage)
        .bind(lead.assigned_to_id)
        .bind(lead.created_by_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(created) = created else {
            let existing = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE phone = $1 AND source = $2")
                .bind(&lead.phone)
                .bind(lead.source)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            // Borrado entre el conflicto y la lectura
            let existing = existing.ok_or_else(|| {
                AppError::Conflict("Lead with this phone and source changed concurrently, retry".to_string())
            })?;
            return Ok(InsertedLead {
                lead: existing,
                created: false,
            });
        };

        insert_activity(&mut *tx, &NewActivity::lead_created(&created, actor_id)).await?;
        tx.commit().await?;

        Ok(InsertedLead {
            lead: created,
            created: true,
        })
    }

    async fn find_lead(&self, id: i64) -> AppResult<Option<Lead>> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    async fn find_leads(&self, ids: &[i64]) -> AppResult<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(order_by_ids(ids, leads, |lead| lead.id))
    }

    async fn find_lead_by_phone_and_source(&self, phone: &str, source: LeadSource) -> AppResult<Option<Lead>> {
        let lead = sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads WHERE phone = $1 AND source = $2 ORDER BY id LIMIT 1",
        )
        .bind(phone)
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lead)
    }

    async fn list_leads(&self, scope: &LeadScope, filters: &LeadFilters) -> AppResult<Vec<Lead>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM leads WHERE TRUE");

        match scope {
            LeadScope::Unrestricted => {}
            LeadScope::OwnedBy(owners) => {
                query.push(" AND assigned_to_id = ANY(").push_bind(owners.clone()).push(")");
            }
            LeadScope::SupportQueue { creator_id } => {
                query
                    .push(" AND (assigned_to_id IS NULL OR created_by_id = ")
                    .push_bind(*creator_id)
                    .push(")");
            }
            LeadScope::Denied => return Ok(Vec::new()),
        }

        if let Some(stage) = filters.stage {
            query.push(" AND stage = ").push_bind(stage);
        }
        if let Some(source) = filters.source {
            query.push(" AND source = ").push_bind(source);
        }
        if let Some(country) = &filters.country {
            query.push(" AND country = ").push_bind(country.clone());
        }
        if let Some(owner) = filters.assigned_to_id {
            query.push(" AND assigned_to_id = ").push_bind(owner);
        }
        if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            query
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR phone ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filters.limit())
            .push(" OFFSET ")
            .push_bind(filters.offset());

        let leads = query.build_query_as::<Lead>().fetch_all(&self.pool).await?;

        Ok(leads)
    }

    async fn update_stage(
        &self,
        id: i64,
        stage: Stage,
        scope: &LeadScope,
        actor_id: i64,
    ) -> AppResult<Option<StageChange>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(None);
        };
        scope.ensure_permits(&current, "update stage")?;
        let previous = current.stage;

        let lead = sqlx::query_as::<_, Lead>(
            "UPDATE leads SET stage = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(stage)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut *tx, &NewActivity::stage_changed(id, actor_id, previous, stage)).await?;
        tx.commit().await?;

        Ok(Some(StageChange { lead, previous }))
    }

    async fn reassign_leads(
        &self,
        ids: &[i64],
        owner_id: i64,
        scope: &LeadScope,
        actor_id: i64,
    ) -> AppResult<Vec<Reassignment>> {
        let mut tx = self.pool.begin().await?;

        // Bloquea las filas en orden de id para evitar interbloqueos entre lotes
        let current = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(ids.to_vec())
            .fetch_all(&mut *tx)
            .await?;

        let present: Vec<i64> = current.iter().map(|lead| lead.id).collect();
        let missing = missing_ids(ids, &present);
        if !missing.is_empty() {
            return Err(AppError::LeadsNotFound(missing));
        }

        let outside: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| current.iter().any(|lead| lead.id == *id && !scope.permits(lead)))
            .collect();
        if !outside.is_empty() {
            return Err(AppError::LeadsOutOfScope(outside));
        }

        let updated = sqlx::query_as::<_, Lead>(
            "UPDATE leads SET assigned_to_id = $2, updated_at = $3 WHERE id = ANY($1) RETURNING *",
        )
        .bind(ids.to_vec())
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_all(&mut *tx)
        .await?;

        let mut reassignments = Vec::with_capacity(updated.len());
        for lead in updated {
            let previous_owner = current
                .iter()
                .find(|locked| locked.id == lead.id)
                .and_then(|locked| locked.assigned_to_id);
            insert_activity(
                &mut *tx,
                &NewActivity::reassigned(lead.id, actor_id, previous_owner, owner_id),
            )
            .await?;
            reassignments.push(Reassignment { lead, previous_owner });
        }

        tx.commit().await?;

        Ok(order_by_ids(ids, reassignments, |r| r.lead.id))
    }

    async fn delete_lead(&self, id: i64, actor_id: i64) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, Lead>("DELETE FROM leads WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(lead) = deleted else {
            return Ok(false);
        };

        insert_activity(&mut *tx, &NewActivity::lead_deleted(&lead, actor_id)).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn record_inbound_message(
        &self,
        id: i64,
        received_at: DateTime<Utc>,
        actor_id: i64,
    ) -> AppResult<Option<Lead>> {
        let mut tx = self.pool.begin().await?;

        let lead = sqlx::query_as::<_, Lead>(
            "UPDATE leads SET last_inbound_message_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(received_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(lead) = lead else {
            return Ok(None);
        };

        insert_activity(&mut *tx, &NewActivity::inbound_message(id, actor_id, received_at)).await?;
        tx.commit().await?;

        Ok(Some(lead))
    }
}
