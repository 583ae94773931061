//! Enrutamiento por rol y alcance de acceso a leads
//!
//! Toda decisión de acceso parte de una [`Identity`] explícita. Una identidad
//! sin rol reconocido no ve ni modifica nada.

use crate::models::auth::{Identity, Role};
use crate::models::lead::Lead;
use crate::utils::errors::{forbidden_error, AppResult};

/// Ruta por defecto cuando el rol no está mapeado
pub const DEFAULT_HOME_ROUTE: &str = "/";

/// Roles que pueden mover leads entre dueños
pub const REASSIGN_ROLES: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Manager, Role::TeamLeader];

/// Roles que pueden borrar leads
pub const DELETE_ROLES: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::Manager];

/// Roles que administran usuarios, equipos y configuración
pub const ADMIN_ROLES: [Role; 2] = [Role::SuperAdmin, Role::Admin];

/// Ruta de inicio para un código de rol. Nunca falla.
pub fn resolve_home_route(role: &str) -> &'static str {
    role.parse::<Role>()
        .map(|role| role.home_route())
        .unwrap_or(DEFAULT_HOME_ROUTE)
}

pub fn home_route_for(identity: &Identity) -> &'static str {
    identity.role.map_or(DEFAULT_HOME_ROUTE, |role| role.home_route())
}

/// Subconjunto de leads visible para una identidad
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadScope {
    /// Sin restricción de propiedad
    Unrestricted,
    /// Leads cuyo `assigned_to_id` está en la lista
    OwnedBy(Vec<i64>),
    /// Leads sin asignar más los creados por `creator_id`
    SupportQueue { creator_id: i64 },
    Denied,
}

impl LeadScope {
    pub fn for_identity(identity: &Identity) -> Self {
        match identity.role {
            Some(Role::SuperAdmin) | Some(Role::Admin) | Some(Role::Manager) => LeadScope::Unrestricted,
            Some(Role::TeamLeader) => {
                let mut owners = identity.team_member_ids.clone();
                owners.push(identity.id);
                owners.sort_unstable();
                owners.dedup();
                LeadScope::OwnedBy(owners)
            }
            Some(Role::Counselor) => LeadScope::OwnedBy(vec![identity.id]),
            Some(Role::CustomerSupport) => LeadScope::SupportQueue {
                creator_id: identity.id,
            },
            None => LeadScope::Denied,
        }
    }

    pub fn permits(&self, lead: &Lead) -> bool {
        match self {
            LeadScope::Unrestricted => true,
            LeadScope::OwnedBy(owners) => lead
                .assigned_to_id
                .map_or(false, |owner| owners.contains(&owner)),
            LeadScope::SupportQueue { creator_id } => {
                lead.assigned_to_id.is_none() || lead.created_by_id == Some(*creator_id)
            }
            LeadScope::Denied => false,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, LeadScope::Denied)
    }

    /// Si un lead de `owner_id` quedaría dentro del alcance
    pub fn includes_owner(&self, owner_id: i64) -> bool {
        match self {
            LeadScope::Unrestricted => true,
            LeadScope::OwnedBy(owners) => owners.contains(&owner_id),
            LeadScope::SupportQueue { .. } | LeadScope::Denied => false,
        }
    }

    /// Falla con `Forbidden` si el lead queda fuera del alcance
    pub fn ensure_permits(&self, lead: &Lead, operation: &str) -> AppResult<()> {
        if self.permits(lead) {
            Ok(())
        } else {
            Err(forbidden_error(
                operation,
                &format!("lead {} is outside of your scope", lead.id),
            ))
        }
    }
}

/// Autores visibles en el feed de actividad
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorScope {
    Everyone,
    Only(Vec<i64>),
    Nobody,
}

impl AuthorScope {
    pub fn for_identity(identity: &Identity) -> Self {
        match LeadScope::for_identity(identity) {
            LeadScope::Unrestricted => AuthorScope::Everyone,
            LeadScope::OwnedBy(ids) => AuthorScope::Only(ids),
            LeadScope::SupportQueue { creator_id } => AuthorScope::Only(vec![creator_id]),
            LeadScope::Denied => AuthorScope::Nobody,
        }
    }
}

pub fn can_access_lead(identity: &Identity, lead: &Lead) -> bool {
    LeadScope::for_identity(identity).permits(lead)
}

/// Falla con `Forbidden` si el lead queda fuera del alcance
pub fn ensure_lead_access(identity: &Identity, lead: &Lead, operation: &str) -> AppResult<()> {
    LeadScope::for_identity(identity).ensure_permits(lead, operation)
}

/// Falla con `Forbidden` si la identidad no tiene alguno de los roles
pub fn ensure_role(identity: &Identity, roles: &[Role], operation: &str) -> AppResult<()> {
    if identity.has_any_role(roles) {
        Ok(())
    } else {
        let reason = match identity.role {
            Some(role) => format!("role {} is not allowed", role),
            None => "unrecognized role".to_string(),
        };
        Err(forbidden_error(operation, &reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lead::Stage;
    use chrono::Utc;

    fn lead(id: i64, owner: Option<i64>, creator: Option<i64>) -> Lead {
        let now = Utc::now();
        Lead {
            id,
            name: format!("Lead {}", id),
            phone: None,
            email: Some(format!("lead{}@example.com", id)),
            country: None,
            source: None,
            program: None,
            intake: None,
            budget: None,
            stage: Stage::New,
            assigned_to_id: owner,
            created_by_id: creator,
            score: None,
            last_inbound_message_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_home_route_for_every_role() {
        assert_eq!(resolve_home_route("SUPER_ADMIN"), "/super-admin");
        assert_eq!(resolve_home_route("ADMIN"), "/admin");
        assert_eq!(resolve_home_route("MANAGER"), "/manager");
        assert_eq!(resolve_home_route("TEAM_LEADER"), "/team-leader");
        assert_eq!(resolve_home_route("COUNSELOR"), "/counselor");
        assert_eq!(resolve_home_route("CUSTOMER_SUPPORT"), "/customer-support");
    }

    #[test]
    fn test_home_route_defaults_for_unknown_roles() {
        for raw in ["", "counselor", "Team Leader", "ROOT", "SUPER_ADMIN ", "🙂"] {
            assert_eq!(resolve_home_route(raw), DEFAULT_HOME_ROUTE);
        }
        assert_eq!(
            home_route_for(&Identity::from_raw_role(1, "GUEST", None)),
            DEFAULT_HOME_ROUTE
        );
    }

    #[test]
    fn test_counselor_sees_only_own_leads() {
        let scope = LeadScope::for_identity(&Identity::new(7, Role::Counselor));
        assert!(scope.permits(&lead(1, Some(7), None)));
        assert!(!scope.permits(&lead(2, Some(8), None)));
        assert!(!scope.permits(&lead(3, None, Some(7))));
    }

    #[test]
    fn test_team_leader_sees_team_and_own_leads() {
        let identity = Identity::new(10, Role::TeamLeader).with_team(vec![7, 8]);
        let scope = LeadScope::for_identity(&identity);
        assert_eq!(scope, LeadScope::OwnedBy(vec![7, 8, 10]));
        assert!(scope.permits(&lead(1, Some(8), None)));
        assert!(scope.permits(&lead(2, Some(10), None)));
        assert!(!scope.permits(&lead(3, Some(9), None)));
        assert!(!scope.permits(&lead(4, None, None)));
    }

    #[test]
    fn test_support_sees_unassigned_and_created() {
        let scope = LeadScope::for_identity(&Identity::new(20, Role::CustomerSupport));
        assert!(scope.permits(&lead(1, None, None)));
        assert!(scope.permits(&lead(2, Some(7), Some(20))));
        assert!(!scope.permits(&lead(3, Some(7), Some(21))));
    }

    #[test]
    fn test_owner_inclusion_follows_scope() {
        let leader = Identity::new(10, Role::TeamLeader).with_team(vec![7]);
        assert!(LeadScope::for_identity(&leader).includes_owner(7));
        assert!(LeadScope::for_identity(&leader).includes_owner(10));
        assert!(!LeadScope::for_identity(&leader).includes_owner(8));

        let counselor = LeadScope::for_identity(&Identity::new(7, Role::Counselor));
        assert!(counselor.includes_owner(7));
        assert!(!counselor.includes_owner(8));

        let support = LeadScope::for_identity(&Identity::new(20, Role::CustomerSupport));
        assert!(!support.includes_owner(20));
        assert!(LeadScope::Unrestricted.includes_owner(99));
    }

    #[test]
    fn test_elevated_roles_are_unrestricted() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Manager] {
            let scope = LeadScope::for_identity(&Identity::new(1, role));
            assert_eq!(scope, LeadScope::Unrestricted);
            assert!(scope.permits(&lead(1, Some(99), None)));
        }
    }

    #[test]
    fn test_unrecognized_role_is_denied() {
        let identity = Identity::from_raw_role(1, "OWNER", None);
        let scope = LeadScope::for_identity(&identity);
        assert!(scope.is_denied());
        assert!(!scope.permits(&lead(1, None, None)));
        assert_eq!(AuthorScope::for_identity(&identity), AuthorScope::Nobody);
        assert!(ensure_lead_access(&identity, &lead(1, None, None), "read lead").is_err());
        assert!(ensure_role(&identity, &REASSIGN_ROLES, "reassign").is_err());
    }
}
