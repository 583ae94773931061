//! Modelos de User y Team
//!
//! Mapean a las tablas users, teams y team_members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::auth::Role;

/// User - mapea exactamente a la tabla users
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Datos para insertar un usuario (password ya hasheado)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub country: Option<String>,
}

/// Response de usuario para la API (sin password)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub role_label: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role_label: user.role.label().to_string(),
            role: user.role,
            country: user.country,
            created_at: user.created_at,
        }
    }
}

/// Team - mapea a la tabla teams
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    pub leader_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Team con la lista de miembros
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    #[serde(flatten)]
    pub team: Team,
    pub member_ids: Vec<i64>,
}
