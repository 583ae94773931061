//! Almacén en memoria
//!
//! Mismas garantías que [`super::PgStore`]: cada método toma el candado de
//! escritura una sola vez, así que un lote de reasignación o un cambio de etapa
//! con su actividad se ven de forma atómica.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use super::{
    missing_ids, order_by_ids, ActivityRepository, EngagementRepository, InsertedLead, LeadRepository,
    Reassignment, SlaRepository, StageChange, UserRepository,
};
use crate::models::activity::{Activity, ActivityFilter, ActivityType, NewActivity};
use crate::models::call_log::{CallLog, NewCallLog};
use crate::models::lead::{Lead, LeadFilters, LeadSource, NewLead, Stage};
use crate::models::note::Note;
use crate::models::qualification::{Qualification, QualificationCategory};
use crate::models::sla::SlaConfig;
use crate::models::user::{NewUser, Team, User};
use crate::services::access_service::LeadScope;
use crate::utils::errors::{conflict_error, AppError, AppResult};

#[derive(Debug, Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Default)]
struct MemoryData {
    users: BTreeMap<i64, User>,
    teams: BTreeMap<i64, Team>,
    team_members: BTreeSet<(i64, i64)>,
    leads: BTreeMap<i64, Lead>,
    notes: BTreeMap<i64, Note>,
    calls: BTreeMap<i64, CallLog>,
    qualifications: BTreeMap<i64, Qualification>,
    activities: Vec<Activity>,
    sla_config: Option<SlaConfig>,
    user_ids: Sequence,
    team_ids: Sequence,
    lead_ids: Sequence,
    note_ids: Sequence,
    call_ids: Sequence,
    qualification_ids: Sequence,
    activity_ids: Sequence,
}

impl MemoryData {
    fn push_activity(&mut self, activity: NewActivity) -> Activity {
        let row = Activity {
            id: self.activity_ids.next(),
            lead_id: activity.lead_id,
            user_id: activity.user_id,
            action: activity.action,
            module: activity.action.module().to_string(),
            details: activity.details,
            created_at: Utc::now(),
        };
        self.activities.push(row.clone());
        row
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut data = self.data.write().await;

        if data
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(conflict_error("User", "email", &user.email));
        }

        let created = User {
            id: data.user_ids.next(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            country: user.country,
            created_at: Utc::now(),
        };
        data.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.data.read().await.users.values().cloned().collect())
    }

    async fn create_team(&self, name: String, country: Option<String>, leader_id: i64) -> AppResult<Team> {
        let mut data = self.data.write().await;

        let team = Team {
            id: data.team_ids.next(),
            name,
            country,
            leader_id,
            created_at: Utc::now(),
        };
        data.teams.insert(team.id, team.clone());

        Ok(team)
    }

    async fn find_team(&self, id: i64) -> AppResult<Option<Team>> {
        Ok(self.data.read().await.teams.get(&id).cloned())
    }

    async fn add_team_member(&self, team_id: i64, user_id: i64) -> AppResult<()> {
        self.data.write().await.team_members.insert((team_id, user_id));
        Ok(())
    }

    async fn team_member_ids(&self, team_id: i64) -> AppResult<Vec<i64>> {
        let data = self.data.read().await;
        Ok(data
            .team_members
            .iter()
            .filter(|(team, _)| *team == team_id)
            .map(|(_, user)| *user)
            .collect())
    }

    async fn member_ids_led_by(&self, leader_id: i64) -> AppResult<Vec<i64>> {
        let data = self.data.read().await;
        let members: BTreeSet<i64> = data
            .team_members
            .iter()
            .filter(|(team, _)| {
                data.teams
                    .get(team)
                    .map_or(false, |team| team.leader_id == leader_id)
            })
            .map(|(_, user)| *user)
            .collect();

        Ok(members.into_iter().collect())
    }
}

#[async_trait]
impl LeadRepository for MemoryStore {
    async fn insert_lead(&self, lead: NewLead, actor_id: i64) -> AppResult<InsertedLead> {
        let mut data = self.data.write().await;

        if let (Some(phone), Some(source)) = (lead.phone.as_deref(), lead.source) {
            let existing = data
                .leads
                .values()
                .find(|l| l.phone.as_deref() == Some(phone) && l.source == Some(source))
                .cloned();
            if let Some(existing) = existing {
                return Ok(InsertedLead {
                    lead: existing,
                    created: false,
                });
            }
        }

        let now = Utc::now();

        let created = Lead {
            id: data.lead_ids.next(),
            name: lead.name,
            phone: lead.phone,
            email: lead.email,
            country: lead.country,
            source: lead.source,
            program: lead.program,
            intake: lead.intake,
            budget: lead.budget,
            stage: lead.stage,
            assigned_to_id: lead.assigned_to_id,
            created_by_id: lead.created_by_id,
            score: None,
            last_inbound_message_at: None,
            created_at: now,
            updated_at: now,
        };
        data.leads.insert(created.id, created.clone());
        data.push_activity(NewActivity::lead_created(&created, actor_id));

        Ok(InsertedLead {
            lead: created,
            created: true,
        })
    }

    async fn find_lead(&self, id: i64) -> AppResult<Option<Lead>> {
        Ok(self.data.read().await.leads.get(&id).cloned())
    }

    async fn find_leads(&self, ids: &[i64]) -> AppResult<Vec<Lead>> {
        let data = self.data.read().await;
        let found = ids
            .iter()
            .filter_map(|id| data.leads.get(id).cloned())
            .collect();

        Ok(order_by_ids(ids, found, |lead| lead.id))
    }

    async fn find_lead_by_phone_and_source(&self, phone: &str, source: LeadSource) -> AppResult<Option<Lead>> {
        let data = self.data.read().await;
        Ok(data
            .leads
            .values()
            .find(|lead| lead.phone.as_deref() == Some(phone) && lead.source == Some(source))
            .cloned())
    }

    async fn list_leads(&self, scope: &LeadScope, filters: &LeadFilters) -> AppResult<Vec<Lead>> {
        if scope.is_denied() {
            return Ok(Vec::new());
        }

        let data = self.data.read().await;
        let mut leads: Vec<Lead> = data
            .leads
            .values()
            .filter(|lead| scope.permits(lead) && filters.matches(lead))
            .cloned()
            .collect();

        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(leads
            .into_iter()
            .skip(filters.offset() as usize)
            .take(filters.limit() as usize)
            .collect())
    }

    async fn update_stage(
        &self,
        id: i64,
        stage: Stage,
        scope: &LeadScope,
        actor_id: i64,
    ) -> AppResult<Option<StageChange>> {
        let mut data = self.data.write().await;

        let Some(lead) = data.leads.get_mut(&id) else {
            return Ok(None);
        };
        scope.ensure_permits(lead, "update stage")?;
        let previous = lead.stage;
        lead.stage = stage;
        lead.updated_at = Utc::now();
        let lead = lead.clone();

        data.push_activity(NewActivity::stage_changed(id, actor_id, previous, stage));

        Ok(Some(StageChange { lead, previous }))
    }

    async fn reassign_leads(
        &self,
        ids: &[i64],
        owner_id: i64,
        scope: &LeadScope,
        actor_id: i64,
    ) -> AppResult<Vec<Reassignment>> {
        let mut data = self.data.write().await;

        let present: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| data.leads.contains_key(id))
            .collect();
        let missing = missing_ids(ids, &present);
        if !missing.is_empty() {
            return Err(AppError::LeadsNotFound(missing));
        }

        let outside: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| data.leads.get(id).is_some_and(|lead| !scope.permits(lead)))
            .collect();
        if !outside.is_empty() {
            return Err(AppError::LeadsOutOfScope(outside));
        }

        let now = Utc::now();
        let mut reassignments = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(lead) = data.leads.get_mut(id) else {
                continue;
            };
            let previous_owner = lead.assigned_to_id;
            lead.assigned_to_id = Some(owner_id);
            lead.updated_at = now;
            let lead = lead.clone();

            data.push_activity(NewActivity::reassigned(*id, actor_id, previous_owner, owner_id));
            reassignments.push(Reassignment { lead, previous_owner });
        }

        Ok(reassignments)
    }

    async fn delete_lead(&self, id: i64, actor_id: i64) -> AppResult<bool> {
        let mut data = self.data.write().await;

        let Some(lead) = data.leads.remove(&id) else {
            return Ok(false);
        };

        data.notes.retain(|_, note| note.lead_id != id);
        data.calls.retain(|_, call| call.lead_id != id);
        data.qualifications.retain(|_, q| q.lead_id != id);
        for activity in data.activities.iter_mut().filter(|a| a.lead_id == Some(id)) {
            activity.lead_id = None;
        }
        data.push_activity(NewActivity::lead_deleted(&lead, actor_id));

        Ok(true)
    }

    async fn record_inbound_message(
        &self,
        id: i64,
        received_at: DateTime<Utc>,
        actor_id: i64,
    ) -> AppResult<Option<Lead>> {
        let mut data = self.data.write().await;

        let Some(lead) = data.leads.get_mut(&id) else {
            return Ok(None);
        };
        lead.last_inbound_message_at = Some(received_at);
        let lead = lead.clone();

        data.push_activity(NewActivity::inbound_message(id, actor_id, received_at));

        Ok(Some(lead))
    }
}

#[async_trait]
impl EngagementRepository for MemoryStore {
    async fn add_note(&self, lead_id: i64, author_id: i64, content: String) -> AppResult<Note> {
        let mut data = self.data.write().await;
        let now = Utc::now();

        let note = Note {
            id: data.note_ids.next(),
            lead_id,
            author_id,
            content,
            created_at: now,
            updated_at: now,
        };
        data.notes.insert(note.id, note.clone());
        data.push_activity(NewActivity::note(&note, ActivityType::NoteAdded));

        Ok(note)
    }

    async fn find_note(&self, id: i64) -> AppResult<Option<Note>> {
        Ok(self.data.read().await.notes.get(&id).cloned())
    }

    async fn update_note(&self, id: i64, content: String) -> AppResult<Option<Note>> {
        let mut data = self.data.write().await;

        let Some(note) = data.notes.get_mut(&id) else {
            return Ok(None);
        };
        note.content = content;
        note.updated_at = Utc::now();
        let note = note.clone();

        data.push_activity(NewActivity::note(&note, ActivityType::NoteUpdated));

        Ok(Some(note))
    }

    async fn delete_note(&self, id: i64) -> AppResult<bool> {
        let mut data = self.data.write().await;

        let Some(note) = data.notes.remove(&id) else {
            return Ok(false);
        };
        data.push_activity(NewActivity::note(&note, ActivityType::NoteDeleted));

        Ok(true)
    }

    async fn list_notes(&self, lead_id: i64) -> AppResult<Vec<Note>> {
        let data = self.data.read().await;
        // Los ids crecen con el tiempo: orden inverso = más recientes primero
        Ok(data
            .notes
            .values()
            .rev()
            .filter(|note| note.lead_id == lead_id)
            .cloned()
            .collect())
    }

    async fn log_call(&self, call: NewCallLog) -> AppResult<CallLog> {
        let mut data = self.data.write().await;

        let logged = CallLog {
            id: data.call_ids.next(),
            lead_id: call.lead_id,
            user_id: call.user_id,
            duration_seconds: call.duration_seconds,
            outcome: call.outcome,
            notes: call.notes,
            called_at: call.called_at,
        };
        data.calls.insert(logged.id, logged.clone());

        if let Some(lead) = data.leads.get_mut(&call.lead_id) {
            lead.last_inbound_message_at = None;
            lead.updated_at = Utc::now();
        }
        data.push_activity(NewActivity::call_logged(&logged));

        Ok(logged)
    }

    async fn list_calls(&self, lead_id: i64) -> AppResult<Vec<CallLog>> {
        let data = self.data.read().await;
        let mut calls: Vec<CallLog> = data
            .calls
            .values()
            .filter(|call| call.lead_id == lead_id)
            .cloned()
            .collect();
        calls.sort_by(|a, b| b.called_at.cmp(&a.called_at).then(b.id.cmp(&a.id)));

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
        let mut data = self.data.write().await;
        let now = Utc::now();

        let Some(lead) = data.leads.get_mut(&lead_id) else {
            return Ok(None);
        };
        lead.score = Some(score);
        lead.updated_at = now;
        let lead = lead.clone();

        let qualification = Qualification {
            id: data.qualification_ids.next(),
            lead_id,
            score,
            category,
            summary,
            created_at: now,
        };
        data.qualifications.insert(qualification.id, qualification.clone());
        data.push_activity(NewActivity::lead_qualified(&qualification, actor_id));

        Ok(Some((qualification, lead)))
    }

    async fn list_qualifications(&self, lead_id: i64) -> AppResult<Vec<Qualification>> {
        let data = self.data.read().await;
        Ok(data
            .qualifications
            .values()
            .rev()
            .filter(|q| q.lead_id == lead_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn append_activity(&self, activity: NewActivity) -> AppResult<Activity> {
        Ok(self.data.write().await.push_activity(activity))
    }

    async fn list_activities(&self, filter: &ActivityFilter) -> AppResult<Vec<Activity>> {
        let data = self.data.read().await;
        Ok(data
            .activities
            .iter()
            .rev()
            .filter(|a| filter.lead_id.map_or(true, |lead_id| a.lead_id == Some(lead_id)))
            .filter(|a| {
                filter
                    .user_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&a.user_id))
            })
            .take(filter.limit.max(1) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SlaRepository for MemoryStore {
    async fn sla_config(&self) -> AppResult<Option<SlaConfig>> {
        Ok(self.data.read().await.sla_config)
    }

    async fn save_sla_config(&self, config: SlaConfig, actor_id: i64) -> AppResult<SlaConfig> {
        let mut data = self.data.write().await;
        data.sla_config = Some(config);
        data.push_activity(NewActivity::sla_config_updated(&config, actor_id));

        Ok(config)
    }

    async fn ensure_sla_config(&self, default: SlaConfig) -> AppResult<SlaConfig> {
        let mut data = self.data.write().await;
        Ok(*data.sla_config.get_or_insert(default))
    }
}
