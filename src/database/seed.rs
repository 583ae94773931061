//! Datos iniciales
//!
//! Siempre garantiza una configuración de SLA. Con `SEED_DEMO_DATA` crea
//! además un usuario por rol y un equipo de ejemplo.

use tracing::info;

use crate::models::auth::Role;
use crate::models::sla::SlaConfig;
use crate::models::user::{NewUser, User};
use crate::repositories::{SharedStore, SlaRepository, UserRepository};
use crate::services::user_service::hash_password;
use crate::utils::errors::AppResult;

pub const DEMO_PASSWORD: &str = "Password123!";

pub async fn seed_store(store: &SharedStore, demo_data: bool) -> AppResult<()> {
    let config = store.ensure_sla_config(SlaConfig::default()).await?;
    info!(
        "⏱️ SLA: respuesta {} min, escalado {} min",
        config.response_minutes, config.escalate_minutes
    );

    if demo_data {
        seed_demo_users(store).await?;
    }

    Ok(())
}

async fn seed_demo_users(store: &SharedStore) -> AppResult<()> {
    let password_hash = hash_password(DEMO_PASSWORD)?;
    let mut created = Vec::with_capacity(Role::ALL.len());

    for role in Role::ALL {
        let email = demo_email(role);
        let user = match store.find_user_by_email(&email).await? {
            Some(existing) => existing,
            None => {
                store
                    .create_user(NewUser {
                        name: format!("Demo {}", role.label()),
                        email,
                        password_hash: password_hash.clone(),
                        role,
                        country: None,
                    })
                    .await?
            }
        };
        created.push(user);
    }

    let leader = find_role(&created, Role::TeamLeader);
    let counselor = find_role(&created, Role::Counselor);
    if let (Some(leader), Some(counselor)) = (leader, counselor) {
        if store.member_ids_led_by(leader.id).await?.is_empty() {
            let team = store.create_team("Demo Team".to_string(), None, leader.id).await?;
            store.add_team_member(team.id, counselor.id).await?;
            info!("👥 Equipo demo {} creado", team.id);
        }
    }

    info!("🌱 Usuarios demo listos ({} roles)", created.len());
    Ok(())
}

fn demo_email(role: Role) -> String {
    format!("{}@demo.local", role.as_str().to_lowercase().replace('_', "."))
}

fn find_role(users: &[User], role: Role) -> Option<&User> {
    users.iter().find(|user| user.role == role)
}
