//! Login y resolución de la identidad del portador del token

use bcrypt::verify;
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse, MeResponse};
use crate::models::auth::{Identity, JwtClaims, Role};
use crate::models::user::UserResponse;
use crate::repositories::{SharedStore, UserRepository};
use crate::services::access_service::home_route_for;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, JwtConfig};

/// Servicio de autenticación
pub struct AuthService {
    store: SharedStore,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(store: SharedStore, jwt: JwtConfig) -> Self {
        Self { store, jwt }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        request.validate()?;

        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = self
            .store
            .find_user_by_email(request.email.trim())
            .await?
            .ok_or_else(invalid)?;

        let matches = verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verifying password: {}", e)))?;
        if !matches {
            tracing::warn!("Failed login for user {}", user.id);
            return Err(invalid());
        }

        let (token, expires_at) = generate_token(&user, &self.jwt)?;
        let home_route = user.role.home_route();
        tracing::info!("User {} logged in as {}", user.id, user.role);

        Ok(LoginResponse {
            token,
            expires_at,
            user: UserResponse::from(user),
            home_route,
        })
    }

    /// Construye la identidad a partir de los claims. Un TEAM_LEADER recibe
    /// los ids de los miembros de sus equipos.
    pub async fn identity_from_claims(&self, claims: &JwtClaims) -> AppResult<Identity> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

        let identity = Identity::from_raw_role(id, &claims.role, claims.country.clone());
        if identity.role.is_none() {
            tracing::warn!("Token for user {} carries unrecognized role '{}'", id, claims.role);
        }

        if identity.has_role(Role::TeamLeader) {
            let members = self.store.member_ids_led_by(id).await?;
            return Ok(identity.with_team(members));
        }

        Ok(identity)
    }

    pub fn me(identity: Identity) -> MeResponse {
        MeResponse {
            role_label: identity.role.map(|role| role.label()),
            home_route: home_route_for(&identity),
            identity,
        }
    }
}
