//! Alta, lectura, cambio de etapa y borrado de leads

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

use crate::dto::lead_dto::{CreateLeadRequest, CreateLeadResponse, LeadDetailResponse};
use crate::models::auth::{Identity, Role};
use crate::models::lead::{Lead, LeadFilters, LeadSource, NewLead, Stage};
use crate::models::user::User;
use crate::repositories::{LeadRepository, SharedStore, SlaRepository, Store, UserRepository};
use crate::services::access_service::{ensure_lead_access, ensure_role, LeadScope, DELETE_ROLES};
use crate::services::sla_service;
use crate::utils::errors::{
    conflict_error, field_error, forbidden_error, not_found_error, validation_error, AppResult,
};
use crate::utils::validation::{
    into_result, normalize_optional, normalize_phone, parse_code, validate_not_blank,
};

/// Busca un lead y comprueba que la identidad pueda operar sobre él
pub(crate) async fn find_accessible_lead(
    store: &dyn Store,
    identity: &Identity,
    lead_id: i64,
    operation: &str,
) -> AppResult<Lead> {
    let lead = store
        .find_lead(lead_id)
        .await?
        .ok_or_else(|| not_found_error("Lead", lead_id))?;

    ensure_lead_access(identity, &lead, operation)?;

    Ok(lead)
}

/// El dueño de un lead debe existir y ser COUNSELOR o TEAM_LEADER
pub(crate) async fn ensure_assignable_owner(store: &dyn Store, owner_id: i64) -> AppResult<User> {
    match store.find_user(owner_id).await? {
        Some(user) if user.role.can_own_leads() => Ok(user),
        Some(user) => Err(validation_error(
            "assignedToId",
            "owner_role",
            format!(
                "user {} has role {} and cannot own leads (COUNSELOR or TEAM_LEADER required)",
                owner_id, user.role
            ),
        )),
        None => Err(validation_error(
            "assignedToId",
            "owner_exists",
            format!("user {} does not exist", owner_id),
        )),
    }
}

/// Recorre todas las páginas del alcance. Para agregados (SLA, dashboard).
pub(crate) async fn collect_scoped_leads(store: &dyn Store, scope: &LeadScope) -> AppResult<Vec<Lead>> {
    let mut leads = Vec::new();
    if scope.is_denied() {
        return Ok(leads);
    }

    let mut filters = LeadFilters {
        limit: Some(LeadFilters::MAX_LIMIT),
        offset: Some(0),
        ..Default::default()
    };
    loop {
        let page = store.list_leads(scope, &filters).await?;
        let done = (page.len() as i64) < LeadFilters::MAX_LIMIT;
        leads.extend(page);
        if done {
            break;
        }
        filters.offset = Some(leads.len() as i64);
    }

    Ok(leads)
}

/// Alta repetida: se devuelve el lead existente si está en el alcance, si no es conflicto
fn existing_lead(scope: &LeadScope, existing: Lead, phone: &str) -> AppResult<CreateLeadResponse> {
    if !scope.permits(&existing) {
        return Err(conflict_error("Lead", "phone", phone));
    }
    tracing::info!("Lead {} already exists for {}, skipping creation", existing.id, phone);

    Ok(CreateLeadResponse {
        lead: existing,
        created: false,
    })
}

/// Servicio de leads
pub struct LeadService {
    store: SharedStore,
}

impl LeadService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Crea un lead. Si ya existe uno con el mismo teléfono y canal se
    /// devuelve ese con `created = false`.
    pub async fn create_lead(
        &self,
        identity: &Identity,
        request: CreateLeadRequest,
    ) -> AppResult<CreateLeadResponse> {
        ensure_role(identity, &Role::ALL, "create lead")?;

        let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);

        if let Err(e) = validate_not_blank(&request.name) {
            errors.add("name", e);
        }

        let phone = normalize_optional(request.phone.clone()).map(|p| normalize_phone(&p));
        let email = normalize_optional(request.email.clone()).map(|e| e.to_lowercase());
        if phone.is_none() && email.is_none() {
            errors.add(
                "phone",
                field_error("contact_required", "phone or email is required"),
            );
        }

        if request.budget.map_or(false, |budget| budget < Decimal::ZERO) {
            errors.add("budget", field_error("range", "budget must not be negative"));
        }

        let source = normalize_optional(request.source.clone())
            .and_then(|raw| parse_code::<LeadSource>(&mut errors, "source", &raw));
        let stage = match normalize_optional(request.stage.clone()) {
            Some(raw) => parse_code::<Stage>(&mut errors, "stage", &raw),
            None => Some(Stage::New),
        };

        into_result(errors)?;
        let stage = stage.unwrap_or(Stage::New);

        let scope = LeadScope::for_identity(identity);

        if let (Some(phone), Some(source)) = (phone.as_deref(), source) {
            if let Some(existing) = self.store.find_lead_by_phone_and_source(phone, source).await? {
                return existing_lead(&scope, existing, phone);
            }
        }

        // Un counselor que captura un lead sin dueño se lo queda
        let assigned_to_id = match (request.assigned_to_id, identity.role) {
            (Some(owner_id), _) => {
                let owner = ensure_assignable_owner(self.store.as_ref(), owner_id).await?;
                if !scope.includes_owner(owner.id) {
                    return Err(forbidden_error(
                        "create lead",
                        &format!("you cannot assign leads to user {}", owner.id),
                    ));
                }
                Some(owner.id)
            }
            (None, Some(Role::Counselor)) => Some(identity.id),
            (None, _) => None,
        };

        let new_lead = NewLead {
            name: request.name.trim().to_string(),
            phone,
            email,
            country: normalize_optional(request.country),
            source,
            program: normalize_optional(request.program),
            intake: normalize_optional(request.intake),
            budget: request.budget,
            stage,
            assigned_to_id,
            created_by_id: Some(identity.id),
        };

        let contact = new_lead.phone.clone();
        let inserted = self.store.insert_lead(new_lead, identity.id).await?;
        if !inserted.created {
            // Otra petición con el mismo teléfono y canal ganó la carrera
            return existing_lead(&scope, inserted.lead, contact.as_deref().unwrap_or_default());
        }
        tracing::info!("Lead {} created by user {}", inserted.lead.id, identity.id);

        Ok(CreateLeadResponse {
            lead: inserted.lead,
            created: true,
        })
    }

    pub async fn get_lead(&self, identity: &Identity, lead_id: i64) -> AppResult<Lead> {
        find_accessible_lead(self.store.as_ref(), identity, lead_id, "read lead").await
    }

    /// Lead con su estado de SLA evaluado en `now`
    pub async fn get_lead_detail(
        &self,
        identity: &Identity,
        lead_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<LeadDetailResponse> {
        let lead = self.get_lead(identity, lead_id).await?;
        let config = self.store.sla_config().await?.unwrap_or_default();
        let sla = sla_service::evaluate(&lead, &config, now);

        Ok(LeadDetailResponse { lead, sla })
    }

    /// Leads visibles: el alcance del rol y luego los filtros
    pub async fn scope_leads_for(&self, identity: &Identity, filters: &LeadFilters) -> AppResult<Vec<Lead>> {
        let scope = LeadScope::for_identity(identity);
        if scope.is_denied() {
            tracing::warn!("User {} has no recognized role, returning no leads", identity.id);
            return Ok(Vec::new());
        }

        self.store.list_leads(&scope, filters).await
    }

    /// Cambia la etapa. Cualquier etapa puede pasar a cualquier otra.
    pub async fn update_stage(&self, identity: &Identity, lead_id: i64, raw_stage: &str) -> AppResult<Lead> {
        let stage = raw_stage
            .parse::<Stage>()
            .map_err(|message| validation_error("stage", "enum", message))?;

        let scope = LeadScope::for_identity(identity);
        let change = self
            .store
            .update_stage(lead_id, stage, &scope, identity.id)
            .await?
            .ok_or_else(|| not_found_error("Lead", lead_id))?;

        tracing::info!(
            "Lead {} moved from {} to {} by user {}",
            lead_id,
            change.previous,
            stage,
            identity.id
        );

        Ok(change.lead)
    }

    pub async fn delete_lead(&self, identity: &Identity, lead_id: i64) -> AppResult<()> {
        ensure_role(identity, &DELETE_ROLES, "delete lead")?;

        if !self.store.delete_lead(lead_id, identity.id).await? {
            return Err(not_found_error("Lead", lead_id));
        }

        tracing::info!("Lead {} deleted by user {}", lead_id, identity.id);
        Ok(())
    }

    /// Mensaje entrante del lead: arranca el reloj de SLA
    pub async fn record_inbound_message(
        &self,
        identity: &Identity,
        lead_id: i64,
        received_at: Option<DateTime<Utc>>,
    ) -> AppResult<Lead> {
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "record inbound message").await?;
        let received_at = received_at.unwrap_or_else(Utc::now);

        if received_at > Utc::now() + chrono::Duration::minutes(5) {
            return Err(validation_error(
                "receivedAt",
                "future",
                "receivedAt must not be in the future",
            ));
        }

        self.store
            .record_inbound_message(lead.id, received_at, identity.id)
            .await?
            .ok_or_else(|| not_found_error("Lead", lead_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::{ActivityFilter, ActivityType};
    use crate::repositories::ActivityRepository;
    use crate::services::test_support::{seed_team, seed_user, store};
    use crate::utils::errors::AppError;

    fn john_doe() -> CreateLeadRequest {
        CreateLeadRequest {
            name: "John Doe".to_string(),
            phone: Some("+919876543210".to_string()),
            source: Some("WhatsApp".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_lead_defaults_to_new() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let service = LeadService::new(store.clone());

        let created = service.create_lead(&admin, john_doe()).await.unwrap();
        assert!(created.created);
        assert_eq!(created.lead.stage, Stage::New);
        assert_eq!(created.lead.source, Some(LeadSource::WhatsApp));
        assert_eq!(created.lead.created_by_id, Some(admin.id));

        let activities = store
            .list_activities(&ActivityFilter {
                lead_id: Some(created.lead.id),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].action, ActivityType::LeadCreated);
    }

    #[tokio::test]
    async fn test_create_lead_requires_contact_channel() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let service = LeadService::new(store);

        let request = CreateLeadRequest {
            name: "No Contact".to_string(),
            ..Default::default()
        };
        let err = service.create_lead(&admin, request).await.unwrap_err();
        match err {
            AppError::Validation(errors) => assert!(errors.field_errors().contains_key("phone")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_lead_reports_every_bad_field() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let service = LeadService::new(store);

        let request = CreateLeadRequest {
            name: "   ".to_string(),
            email: Some("not-an-email".to_string()),
            source: Some("Carrier Pigeon".to_string()),
            stage: Some("WON".to_string()),
            budget: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        let err = service.create_lead(&admin, request).await.unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields = errors.field_errors();
        for field in ["name", "email", "source", "stage", "budget"] {
            assert!(fields.contains_key(field), "missing error for {}", field);
        }
    }

    #[tokio::test]
    async fn test_create_lead_is_idempotent_on_phone_and_source() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let service = LeadService::new(store);

        let first = service.create_lead(&admin, john_doe()).await.unwrap();
        let retry = CreateLeadRequest {
            phone: Some("+91 98765 43210".to_string()),
            ..john_doe()
        };
        let second = service.create_lead(&admin, retry).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.lead.id, first.lead.id);
        let all = service
            .scope_leads_for(&admin, &LeadFilters::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_create_lead_rejects_non_counselor_owner() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let manager = seed_user(&store, Role::Manager).await;
        let service = LeadService::new(store);

        let request = CreateLeadRequest {
            assigned_to_id: Some(manager.id),
            ..john_doe()
        };
        let err = service.create_lead(&admin, request).await.unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.field_errors().contains_key("assignedToId"));
    }

    #[tokio::test]
    async fn test_owner_at_creation_must_be_in_caller_scope() {
        let store = store();
        let counselor = seed_user(&store, Role::Counselor).await;
        let peer = seed_user(&store, Role::Counselor).await;
        let outsider = seed_user(&store, Role::Counselor).await;
        let support = seed_user(&store, Role::CustomerSupport).await;
        let leader = seed_team(&store, &[peer.id]).await;
        let service = LeadService::new(store);

        let assign_to = |owner: i64, n: usize| CreateLeadRequest {
            name: format!("Assigned {}", n),
            email: Some(format!("assigned{}@example.com", n)),
            assigned_to_id: Some(owner),
            ..Default::default()
        };

        for (n, (actor, owner)) in [(&counselor, peer.id), (&support, counselor.id), (&leader, outsider.id)]
            .into_iter()
            .enumerate()
        {
            let err = service.create_lead(actor, assign_to(owner, n)).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "actor {} owner {}", actor.id, owner);
        }

        let own = service.create_lead(&counselor, assign_to(counselor.id, 10)).await.unwrap();
        assert_eq!(own.lead.assigned_to_id, Some(counselor.id));
        let team = service.create_lead(&leader, assign_to(peer.id, 11)).await.unwrap();
        assert_eq!(team.lead.assigned_to_id, Some(peer.id));
    }

    #[tokio::test]
    async fn test_lost_insert_race_respects_scope() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let owner = seed_user(&store, Role::Counselor).await;
        let other = seed_user(&store, Role::Counselor).await;
        let service = LeadService::new(store);

        let request = CreateLeadRequest {
            assigned_to_id: Some(owner.id),
            ..john_doe()
        };
        let existing = service.create_lead(&admin, request).await.unwrap().lead;

        let same = existing_lead(&LeadScope::for_identity(&owner), existing.clone(), "+919876543210").unwrap();
        assert!(!same.created);
        assert_eq!(same.lead.id, existing.id);

        let err = existing_lead(&LeadScope::for_identity(&other), existing, "+919876543210").unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unrecognized_role_cannot_create() {
        let store = store();
        let service = LeadService::new(store);
        let ghost = Identity::from_raw_role(99, "INTERN", None);

        let err = service.create_lead(&ghost, john_doe()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_every_stage_is_accepted_and_logged_once() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let service = LeadService::new(store.clone());
        let lead = service.create_lead(&admin, john_doe()).await.unwrap().lead;

        for stage in Stage::ALL {
            let updated = service.update_stage(&admin, lead.id, stage.as_str()).await.unwrap();
            assert_eq!(updated.stage, stage);
        }
        // Repetir la misma etapa deja el mismo estado y una actividad por llamada
        service.update_stage(&admin, lead.id, "LOST").await.unwrap();

        let changes = store
            .list_activities(&ActivityFilter {
                lead_id: Some(lead.id),
                limit: 100,
                ..Default::default()
            })
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.action == ActivityType::StageChanged)
            .count();
        assert_eq!(changes, Stage::ALL.len() + 1);
        assert_eq!(service.get_lead(&admin, lead.id).await.unwrap().stage, Stage::Lost);
    }

    #[tokio::test]
    async fn test_invalid_stage_is_rejected_before_lookup() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let service = LeadService::new(store);

        let err = service.update_stage(&admin, 12345, "INVALID").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.update_stage(&admin, 12345, "LOST").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_counselor_cannot_touch_foreign_lead() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let owner = seed_user(&store, Role::Counselor).await;
        let other = seed_user(&store, Role::Counselor).await;
        let service = LeadService::new(store);

        let request = CreateLeadRequest {
            assigned_to_id: Some(owner.id),
            ..john_doe()
        };
        let lead = service.create_lead(&admin, request).await.unwrap().lead;

        assert!(service.get_lead(&owner, lead.id).await.is_ok());
        let err = service.update_stage(&other, lead.id, "CONTACTED").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_counselor_scope_equals_owned_leads() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let counselor = seed_user(&store, Role::Counselor).await;
        let other = seed_user(&store, Role::Counselor).await;
        let service = LeadService::new(store);

        for (i, owner) in [Some(counselor.id), Some(other.id), None, Some(counselor.id)]
            .into_iter()
            .enumerate()
        {
            let request = CreateLeadRequest {
                name: format!("Lead {}", i),
                email: Some(format!("lead{}@example.com", i)),
                assigned_to_id: owner,
                stage: Some(if i == 3 { "LOST" } else { "NEW" }.to_string()),
                ..Default::default()
            };
            service.create_lead(&admin, request).await.unwrap();
        }

        let scoped = service
            .scope_leads_for(&counselor, &LeadFilters::default())
            .await
            .unwrap();
        assert_eq!(scoped.len(), 2);
        assert!(scoped.iter().all(|l| l.assigned_to_id == Some(counselor.id)));

        // Un filtro de otro dueño no amplía el alcance
        let widened = service
            .scope_leads_for(
                &counselor,
                &LeadFilters {
                    assigned_to_id: Some(other.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(widened.is_empty());

        let narrowed = service
            .scope_leads_for(
                &counselor,
                &LeadFilters {
                    stage: Some(Stage::Lost),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(narrowed.len(), 1);
    }

    #[tokio::test]
    async fn test_counselor_keeps_leads_it_captures() {
        let store = store();
        let counselor = seed_user(&store, Role::Counselor).await;
        let service = LeadService::new(store);

        let lead = service.create_lead(&counselor, john_doe()).await.unwrap().lead;
        assert_eq!(lead.assigned_to_id, Some(counselor.id));
    }

    #[tokio::test]
    async fn test_only_elevated_roles_delete() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let leader = seed_user(&store, Role::TeamLeader).await;
        let service = LeadService::new(store);
        let lead = service.create_lead(&admin, john_doe()).await.unwrap().lead;

        let err = service.delete_lead(&leader, lead.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        service.delete_lead(&admin, lead.id).await.unwrap();
        let err = service.delete_lead(&admin, lead.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_inbound_message_starts_sla_clock() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let service = LeadService::new(store);
        let lead = service.create_lead(&admin, john_doe()).await.unwrap().lead;

        let received_at = Utc::now() - chrono::Duration::minutes(90);
        let updated = service
            .record_inbound_message(&admin, lead.id, Some(received_at))
            .await
            .unwrap();
        assert_eq!(updated.last_inbound_message_at, Some(received_at));

        let detail = service.get_lead_detail(&admin, lead.id, Utc::now()).await.unwrap();
        assert_eq!(detail.sla.status, crate::models::sla::SlaStatus::Warning);
    }
}
