use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles del sistema - mapea al ENUM user_role
///
/// El código de máquina es la única representación persistida; la etiqueta
/// legible se deriva con [`Role::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    TeamLeader,
    Counselor,
    CustomerSupport,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Manager,
        Role::TeamLeader,
        Role::Counselor,
        Role::CustomerSupport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::TeamLeader => "TEAM_LEADER",
            Role::Counselor => "COUNSELOR",
            Role::CustomerSupport => "CUSTOMER_SUPPORT",
        }
    }

    /// Etiqueta para mostrar en pantalla
    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::TeamLeader => "Team Leader",
            Role::Counselor => "Counselor",
            Role::CustomerSupport => "Customer Support",
        }
    }

    /// Ruta de inicio del dashboard para el rol
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "/super-admin",
            Role::Admin => "/admin",
            Role::Manager => "/manager",
            Role::TeamLeader => "/team-leader",
            Role::Counselor => "/counselor",
            Role::CustomerSupport => "/customer-support",
        }
    }

    /// Roles sin restricción de propiedad sobre los leads
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin | Role::Manager)
    }

    /// Roles que pueden ser dueños de un lead
    pub fn can_own_leads(&self) -> bool {
        matches!(self, Role::Counselor | Role::TeamLeader)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Comparación exacta, sensible a mayúsculas
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Identidad autenticada que se pasa explícitamente a cada operación con alcance.
///
/// `role` es `None` cuando el rol recibido no es uno de los seis reconocidos;
/// en ese caso todas las operaciones sobre leads se deniegan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: i64,
    pub role: Option<Role>,
    pub country: Option<String>,
    #[serde(default)]
    pub team_member_ids: Vec<i64>,
}

impl Identity {
    pub fn new(id: i64, role: Role) -> Self {
        Self {
            id,
            role: Some(role),
            country: None,
            team_member_ids: Vec::new(),
        }
    }

    /// Construye una identidad desde el código de rol tal como llega (JWT, cabeceras)
    pub fn from_raw_role(id: i64, raw_role: &str, country: Option<String>) -> Self {
        Self {
            id,
            role: raw_role.parse().ok(),
            country,
            team_member_ids: Vec::new(),
        }
    }

    pub fn with_team(mut self, member_ids: Vec<i64>) -> Self {
        self.team_member_ids = member_ids;
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role.map_or(false, |role| roles.contains(&role))
    }
}

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // user_id
    pub email: String,
    pub role: String,
    pub country: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_codes_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_role_parse_is_case_sensitive() {
        assert!("team_leader".parse::<Role>().is_err());
        assert!("Team Leader".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_uses_machine_codes() {
        let json = serde_json::to_string(&Role::CustomerSupport).unwrap();
        assert_eq!(json, "\"CUSTOMER_SUPPORT\"");
        assert_eq!(Role::CustomerSupport.label(), "Customer Support");
    }

    #[test]
    fn test_unrecognized_role_yields_no_role() {
        let identity = Identity::from_raw_role(9, "STUDENT", None);
        assert_eq!(identity.role, None);
        assert!(!identity.has_any_role(&Role::ALL));
    }
}
