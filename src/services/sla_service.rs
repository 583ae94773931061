//! Evaluación del SLA de respuesta
//!
//! El estado se calcula al leer: no hay temporizador ni se modifica el lead.
//! El reloj arranca en `last_inbound_message_at` o, si no hay mensaje
//! pendiente, en `updated_at`.

use chrono::{DateTime, Utc};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::dto::sla_dto::{SlaBreach, SlaBreachListResponse, UpdateSlaConfigRequest};
use crate::models::auth::Identity;
use crate::models::lead::Lead;
use crate::models::sla::{SlaConfig, SlaEvaluation, SlaStatus};
use crate::repositories::{SharedStore, SlaRepository};
use crate::services::access_service::{ensure_role, LeadScope, ADMIN_ROLES};
use crate::services::lead_service::{collect_scoped_leads, find_accessible_lead};
use crate::utils::errors::{field_error, AppResult};
use crate::utils::validation::into_result;

/// Minutos completos transcurridos desde el ancla, nunca negativos
pub fn elapsed_minutes(anchor: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - anchor).num_minutes().max(0)
}

pub fn status_for(elapsed_minutes: i64, config: &SlaConfig) -> SlaStatus {
    if elapsed_minutes >= i64::from(config.escalate_minutes) {
        SlaStatus::Breached
    } else if elapsed_minutes >= i64::from(config.response_minutes) {
        SlaStatus::Warning
    } else {
        SlaStatus::OnTime
    }
}

/// Estado de SLA de un lead en `now`
pub fn evaluate(lead: &Lead, config: &SlaConfig, now: DateTime<Utc>) -> SlaEvaluation {
    let anchor = lead.last_inbound_message_at.unwrap_or(lead.updated_at);
    let elapsed = elapsed_minutes(anchor, now);

    SlaEvaluation {
        lead_id: lead.id,
        status: status_for(elapsed, config),
        elapsed_minutes: elapsed,
        anchor,
    }
}

/// Entrada del heap: mayor tiempo primero, a igualdad el id menor
struct Ranked(SlaBreach);

impl Ranked {
    fn key(&self) -> (i64, Reverse<i64>) {
        (self.0.evaluation.elapsed_minutes, Reverse(self.0.lead.id))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Leads en WARNING o BREACHED, el peor primero.
///
/// Cada elemento se extrae del heap bajo demanda, así que tomar los primeros
/// `n` no ordena el resto.
pub fn list_breaches<I>(leads: I, config: &SlaConfig, now: DateTime<Utc>) -> impl Iterator<Item = SlaBreach>
where
    I: IntoIterator<Item = Lead>,
{
    let mut heap: BinaryHeap<Ranked> = leads
        .into_iter()
        .filter_map(|lead| {
            let evaluation = evaluate(&lead, config, now);
            (evaluation.status > SlaStatus::OnTime).then_some(Ranked(SlaBreach { lead, evaluation }))
        })
        .collect();

    std::iter::from_fn(move || heap.pop().map(|ranked| ranked.0))
}

/// Umbral de respuesta positivo y escalado no menor que la respuesta
pub fn validate_config(config: &SlaConfig) -> AppResult<()> {
    let mut errors = validator::ValidationErrors::new();

    if config.response_minutes <= 0 {
        errors.add(
            "responseMinutes",
            field_error("range", "responseMinutes must be greater than zero"),
        );
    }
    if config.escalate_minutes < config.response_minutes {
        errors.add(
            "escalateMinutes",
            field_error(
                "range",
                "escalateMinutes must be greater than or equal to responseMinutes",
            ),
        );
    }

    into_result(errors)?;
    Ok(())
}

/// Servicio de SLA
pub struct SlaService {
    store: SharedStore,
}

impl SlaService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn config(&self) -> AppResult<SlaConfig> {
        Ok(self.store.sla_config().await?.unwrap_or_default())
    }

    pub async fn update_config(
        &self,
        identity: &Identity,
        request: UpdateSlaConfigRequest,
    ) -> AppResult<SlaConfig> {
        ensure_role(identity, &ADMIN_ROLES, "update SLA configuration")?;

        let config = SlaConfig::from(request);
        validate_config(&config)?;

        let saved = self.store.save_sla_config(config, identity.id).await?;
        tracing::info!(
            "SLA configuration set to {}/{} minutes by user {}",
            saved.response_minutes,
            saved.escalate_minutes,
            identity.id
        );

        Ok(saved)
    }

    pub async fn lead_sla(&self, identity: &Identity, lead_id: i64, now: DateTime<Utc>) -> AppResult<SlaEvaluation> {
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "read lead SLA").await?;
        let config = self.config().await?;

        Ok(evaluate(&lead, &config, now))
    }

    /// Alertas de SLA dentro del alcance. Los leads cerrados no cuentan.
    pub async fn breaches(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> AppResult<SlaBreachListResponse> {
        let config = self.config().await?;
        let scope = LeadScope::for_identity(identity);
        let leads = collect_scoped_leads(self.store.as_ref(), &scope).await?;

        let open = leads.into_iter().filter(|lead| !lead.stage.is_terminal());
        let breaches = list_breaches(open, &config, now)
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        Ok(SlaBreachListResponse { config, breaches })
    }
}
