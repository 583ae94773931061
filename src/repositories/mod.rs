//! Capa de persistencia
//!
//! Los servicios trabajan contra estos traits. Hay dos implementaciones:
//! [`PgStore`] sobre PostgreSQL y [`memory::MemoryStore`] en memoria
//! (tests y ejecución local sin base de datos). Cada operación que modifica
//! un lead escribe su entrada de auditoría en la misma transacción.

pub mod activity_repository;
pub mod engagement_repository;
pub mod lead_repository;
pub mod memory;
pub mod sla_repository;
pub mod user_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::models::activity::{Activity, ActivityFilter, NewActivity};
use crate::models::call_log::{CallLog, NewCallLog};
use crate::models::lead::{Lead, LeadFilters, LeadSource, NewLead, Stage};
use crate::models::note::Note;
use crate::models::qualification::{Qualification, QualificationCategory};
use crate::models::sla::SlaConfig;
use crate::models::user::{NewUser, Team, User};
use crate::services::access_service::LeadScope;
use crate::utils::errors::AppResult;

pub use memory::MemoryStore;

/// Resultado de un alta: `created = false` si ya había un lead con el mismo
/// teléfono y canal
#[derive(Debug, Clone)]
pub struct InsertedLead {
    pub lead: Lead,
    pub created: bool,
}

/// Resultado de un cambio de etapa
#[derive(Debug, Clone)]
pub struct StageChange {
    pub lead: Lead,
    pub previous: Stage,
}

/// Resultado de reasignar un lead
#[derive(Debug, Clone)]
pub struct Reassignment {
    pub lead: Lead,
    pub previous_owner: Option<i64>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `Conflict` si el email ya existe
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn find_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn list_users(&self) -> AppResult<Vec<User>>;
    async fn create_team(&self, name: String, country: Option<String>, leader_id: i64) -> AppResult<Team>;
    async fn find_team(&self, id: i64) -> AppResult<Option<Team>>;
    /// Idempotente
    async fn add_team_member(&self, team_id: i64, user_id: i64) -> AppResult<()>;
    async fn team_member_ids(&self, team_id: i64) -> AppResult<Vec<i64>>;
    /// Miembros de todos los equipos que lidera `leader_id`
    async fn member_ids_led_by(&self, leader_id: i64) -> AppResult<Vec<i64>>;
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Inserta el lead y su actividad LEAD_CREATED. Con teléfono y canal
    /// repetidos devuelve el existente sin escribir nada.
    async fn insert_lead(&self, lead: NewLead, actor_id: i64) -> AppResult<InsertedLead>;
    async fn find_lead(&self, id: i64) -> AppResult<Option<Lead>>;
    async fn find_leads(&self, ids: &[i64]) -> AppResult<Vec<Lead>>;
    async fn find_lead_by_phone_and_source(&self, phone: &str, source: LeadSource) -> AppResult<Option<Lead>>;
    /// Alcance y filtros se intersectan antes de paginar
    async fn list_leads(&self, scope: &LeadScope, filters: &LeadFilters) -> AppResult<Vec<Lead>>;
    /// `scope` se comprueba sobre la fila bloqueada
    async fn update_stage(
        &self,
        id: i64,
        stage: Stage,
        scope: &LeadScope,
        actor_id: i64,
    ) -> AppResult<Option<StageChange>>;
    /// Todo o nada: `LeadsNotFound` con los ids ausentes, `LeadsOutOfScope`
    /// con los que `scope` no permite. En ambos casos sin cambios.
    async fn reassign_leads(
        &self,
        ids: &[i64],
        owner_id: i64,
        scope: &LeadScope,
        actor_id: i64,
    ) -> AppResult<Vec<Reassignment>>;
    async fn delete_lead(&self, id: i64, actor_id: i64) -> AppResult<bool>;
    async fn record_inbound_message(
        &self,
        id: i64,
        received_at: DateTime<Utc>,
        actor_id: i64,
    ) -> AppResult<Option<Lead>>;
}

#[async_trait]
pub trait EngagementRepository: Send + Sync {
    async fn add_note(&self, lead_id: i64, author_id: i64, content: String) -> AppResult<Note>;
    async fn find_note(&self, id: i64) -> AppResult<Option<Note>>;
    async fn update_note(&self, id: i64, content: String) -> AppResult<Option<Note>>;
    async fn delete_note(&self, id: i64) -> AppResult<bool>;
    async fn list_notes(&self, lead_id: i64) -> AppResult<Vec<Note>>;
    /// Registrar una llamada también reinicia el reloj de SLA del lead
    async fn log_call(&self, call: NewCallLog) -> AppResult<CallLog>;
    async fn list_calls(&self, lead_id: i64) -> AppResult<Vec<CallLog>>;
    async fn record_qualification(
        &self,
        lead_id: i64,
        score: i32,
        category: QualificationCategory,
        summary: Option<String>,
        actor_id: i64,
    ) -> AppResult<Option<(Qualification, Lead)>>;
    async fn list_qualifications(&self, lead_id: i64) -> AppResult<Vec<Qualification>>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn append_activity(&self, activity: NewActivity) -> AppResult<Activity>;
    /// Más recientes primero
    async fn list_activities(&self, filter: &ActivityFilter) -> AppResult<Vec<Activity>>;
}

#[async_trait]
pub trait SlaRepository: Send + Sync {
    async fn sla_config(&self) -> AppResult<Option<SlaConfig>>;
    async fn save_sla_config(&self, config: SlaConfig, actor_id: i64) -> AppResult<SlaConfig>;
    /// Inserta `default` solo si no hay configuración
    async fn ensure_sla_config(&self, default: SlaConfig) -> AppResult<SlaConfig>;
}

/// Almacén completo usado por los servicios
pub trait Store:
    UserRepository + LeadRepository + EngagementRepository + ActivityRepository + SlaRepository
{
}

impl<T> Store for T where
    T: UserRepository + LeadRepository + EngagementRepository + ActivityRepository + SlaRepository
{
}

pub type SharedStore = Arc<dyn Store>;

/// Almacén PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Ordena `found` según el orden de `ids`
pub(crate) fn order_by_ids<T>(ids: &[i64], mut found: Vec<T>, id_of: impl Fn(&T) -> i64) -> Vec<T> {
    found.sort_by_key(|item| ids.iter().position(|id| *id == id_of(item)).unwrap_or(usize::MAX));
    found
}

/// Ids de `ids` que no aparecen en `present`
pub(crate) fn missing_ids(ids: &[i64], present: &[i64]) -> Vec<i64> {
    ids.iter().copied().filter(|id| !present.contains(id)).collect()
}
