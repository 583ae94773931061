//! Services module
//!
//! Lógica de negocio del CRM. Cada servicio recibe la identidad explícita
//! del usuario y trabaja contra el almacén compartido.

pub mod access_service;
pub mod activity_service;
pub mod assignment_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod engagement_service;
pub mod lead_service;
pub mod sla_service;
pub mod user_service;

pub use access_service::{resolve_home_route, LeadScope};
pub use activity_service::ActivityService;
pub use assignment_service::AssignmentService;
pub use auth_service::AuthService;
pub use dashboard_service::DashboardService;
pub use engagement_service::EngagementService;
pub use lead_service::LeadService;
pub use sla_service::SlaService;
pub use user_service::UserService;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use crate::models::auth::{Identity, Role};
    use crate::models::user::NewUser;
    use crate::repositories::{MemoryStore, SharedStore, UserRepository};

    static NEXT_EMAIL: AtomicU64 = AtomicU64::new(1);

    pub fn store() -> SharedStore {
        Arc::new(MemoryStore::new())
    }

    pub async fn seed_user(store: &SharedStore, role: Role) -> Identity {
        let n = NEXT_EMAIL.fetch_add(1, Ordering::Relaxed);
        let user = store
            .create_user(NewUser {
                name: format!("{} {}", role.label(), n),
                email: format!("user{}@example.com", n),
                password_hash: "not-a-real-hash".to_string(),
                role,
                country: None,
            })
            .await
            .unwrap();
        Identity::new(user.id, role)
    }

    /// Crea un TEAM_LEADER con un equipo formado por `members`
    pub async fn seed_team(store: &SharedStore, members: &[i64]) -> Identity {
        let leader = seed_user(store, Role::TeamLeader).await;
        let team = store
            .create_team(format!("Team {}", leader.id), None, leader.id)
            .await
            .unwrap();
        for member in members {
            store.add_team_member(team.id, *member).await.unwrap();
        }
        let member_ids = store.member_ids_led_by(leader.id).await.unwrap();
        leader.with_team(member_ids)
    }
}
