//! Reasignación masiva de leads
//!
//! El lote es todo o nada: cualquier fallo (dueño inválido, id inexistente,
//! lead fuera de alcance) rechaza la operación completa antes de escribir.
//! El alcance de los leads se comprueba dentro del almacén, sobre las filas
//! ya bloqueadas.

use std::collections::HashSet;

use crate::dto::lead_dto::{ReassignRequest, ReassignResponse};
use crate::models::auth::Identity;
use crate::repositories::{LeadRepository, SharedStore};
use crate::services::access_service::{ensure_role, LeadScope, REASSIGN_ROLES};
use crate::services::lead_service::ensure_assignable_owner;
use crate::utils::errors::{forbidden_error, validation_error, AppResult};

/// Ids sin repetir, en el orden recibido
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Servicio de asignación
pub struct AssignmentService {
    store: SharedStore,
}

impl AssignmentService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn reassign(&self, identity: &Identity, request: ReassignRequest) -> AppResult<ReassignResponse> {
        ensure_role(identity, &REASSIGN_ROLES, "reassign leads")?;

        let lead_ids = dedup_ids(&request.lead_ids);
        if lead_ids.is_empty() {
            return Err(validation_error(
                "leadIds",
                "required",
                "at least one lead id is required",
            ));
        }

        let owner = ensure_assignable_owner(self.store.as_ref(), request.assigned_to_id).await?;

        let scope = LeadScope::for_identity(identity);
        if !scope.includes_owner(owner.id) {
            return Err(forbidden_error(
                "reassign leads",
                &format!("user {} is not a member of your team", owner.id),
            ));
        }

        let reassigned = self
            .store
            .reassign_leads(&lead_ids, owner.id, &scope, identity.id)
            .await?;

        tracing::info!(
            "User {} reassigned {} lead(s) to user {}",
            identity.id,
            reassigned.len(),
            owner.id
        );

        Ok(ReassignResponse {
            assigned_to_id: owner.id,
            leads: reassigned.into_iter().map(|r| r.lead).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::lead_dto::CreateLeadRequest;
    use crate::models::auth::Role;
    use crate::utils::errors::AppError;
    use crate::models::activity::{ActivityFilter, ActivityType};
    use crate::models::lead::Lead;
    use crate::repositories::ActivityRepository;
    use crate::services::lead_service::LeadService;
    use crate::services::test_support::{seed_team, seed_user, store};

    async fn lead_for(service: &LeadService, creator: &Identity, owner: Option<i64>, n: usize) -> Lead {
        let request = CreateLeadRequest {
            name: format!("Lead {}", n),
            email: Some(format!("lead{}@example.com", n)),
            assigned_to_id: owner,
            ..Default::default()
        };
        service.create_lead(creator, request).await.unwrap().lead
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_reassign_moves_every_lead() {
        let store = store();
        let manager = seed_user(&store, Role::Manager).await;
        let from = seed_user(&store, Role::Counselor).await;
        let to = seed_user(&store, Role::Counselor).await;
        let leads = LeadService::new(store.clone());
        let l1 = lead_for(&leads, &manager, Some(from.id), 1).await;
        let l2 = lead_for(&leads, &manager, None, 2).await;

        let service = AssignmentService::new(store.clone());
        let response = service
            .reassign(
                &manager,
                ReassignRequest {
                    lead_ids: vec![l1.id, l2.id, l1.id],
                    assigned_to_id: to.id,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.leads.len(), 2);
        assert!(response.leads.iter().all(|l| l.assigned_to_id == Some(to.id)));

        let activity = store
            .list_activities(&ActivityFilter {
                lead_id: Some(l1.id),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.action == ActivityType::Reassigned)
            .unwrap();
        assert_eq!(activity.details["from"], from.id);
        assert_eq!(activity.details["to"], to.id);
        assert_eq!(activity.details["actor"], manager.id);
    }

    #[tokio::test]
    async fn test_unknown_lead_rejects_whole_batch() {
        let store = store();
        let manager = seed_user(&store, Role::Manager).await;
        let from = seed_user(&store, Role::Counselor).await;
        let to = seed_user(&store, Role::Counselor).await;
        let leads = LeadService::new(store.clone());
        let l1 = lead_for(&leads, &manager, Some(from.id), 1).await;

        let service = AssignmentService::new(store.clone());
        let err = service
            .reassign(
                &manager,
                ReassignRequest {
                    lead_ids: vec![l1.id, 4040],
                    assigned_to_id: to.id,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::LeadsNotFound(ref ids) if ids == &vec![4040]));
        assert_eq!(
            leads.get_lead(&manager, l1.id).await.unwrap().assigned_to_id,
            Some(from.id)
        );
    }

    #[tokio::test]
    async fn test_invalid_owner_changes_nothing() {
        let store = store();
        let manager = seed_user(&store, Role::Manager).await;
        let support = seed_user(&store, Role::CustomerSupport).await;
        let from = seed_user(&store, Role::Counselor).await;
        let leads = LeadService::new(store.clone());
        let l1 = lead_for(&leads, &manager, Some(from.id), 1).await;
        let l2 = lead_for(&leads, &manager, Some(from.id), 2).await;

        let service = AssignmentService::new(store.clone());
        for owner in [support.id, 777] {
            let err = service
                .reassign(
                    &manager,
                    ReassignRequest {
                        lead_ids: vec![l1.id, l2.id],
                        assigned_to_id: owner,
                    },
                )
                .await
                .unwrap_err();
            let AppError::Validation(errors) = err else {
                panic!("expected validation error");
            };
            assert!(errors.field_errors().contains_key("assignedToId"));
        }

        for id in [l1.id, l2.id] {
            assert_eq!(
                leads.get_lead(&manager, id).await.unwrap().assigned_to_id,
                Some(from.id)
            );
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_invalid() {
        let store = store();
        let manager = seed_user(&store, Role::Manager).await;
        let to = seed_user(&store, Role::Counselor).await;

        let err = AssignmentService::new(store)
            .reassign(
                &manager,
                ReassignRequest {
                    lead_ids: Vec::new(),
                    assigned_to_id: to.id,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_counselor_cannot_reassign() {
        let store = store();
        let manager = seed_user(&store, Role::Manager).await;
        let counselor = seed_user(&store, Role::Counselor).await;
        let other = seed_user(&store, Role::Counselor).await;
        let leads = LeadService::new(store.clone());
        let lead = lead_for(&leads, &manager, Some(counselor.id), 1).await;

        let err = AssignmentService::new(store)
            .reassign(
                &counselor,
                ReassignRequest {
                    lead_ids: vec![lead.id],
                    assigned_to_id: other.id,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_team_leader_limited_to_team() {
        let store = store();
        let manager = seed_user(&store, Role::Manager).await;
        let member_a = seed_user(&store, Role::Counselor).await;
        let member_b = seed_user(&store, Role::Counselor).await;
        let outsider = seed_user(&store, Role::Counselor).await;
        let leader = seed_team(&store, &[member_a.id, member_b.id]).await;

        let leads = LeadService::new(store.clone());
        let mine = lead_for(&leads, &manager, Some(member_a.id), 1).await;
        let foreign = lead_for(&leads, &manager, Some(outsider.id), 2).await;
        let service = AssignmentService::new(store);

        let err = service
            .reassign(
                &leader,
                ReassignRequest {
                    lead_ids: vec![mine.id, foreign.id],
                    assigned_to_id: member_b.id,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LeadsOutOfScope(ref ids) if ids == &vec![foreign.id]));

        let err = service
            .reassign(
                &leader,
                ReassignRequest {
                    lead_ids: vec![mine.id],
                    assigned_to_id: outsider.id,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let ok = service
            .reassign(
                &leader,
                ReassignRequest {
                    lead_ids: vec![mine.id],
                    assigned_to_id: member_b.id,
                },
            )
            .await
            .unwrap();
        assert_eq!(ok.leads[0].assigned_to_id, Some(member_b.id));
    }
}
