//! Alta de usuarios y gestión de equipos

use bcrypt::hash;
use serde_json::json;
use validator::{Validate, ValidationErrors};

use crate::dto::user_dto::{AddTeamMemberRequest, CreateTeamRequest, CreateUserRequest};
use crate::models::activity::NewActivity;
use crate::models::auth::{Identity, Role};
use crate::models::user::{NewUser, TeamResponse, UserResponse};
use crate::repositories::{ActivityRepository, SharedStore, UserRepository};
use crate::services::access_service::{ensure_role, ADMIN_ROLES};
use crate::utils::errors::{
    conflict_error, field_error, forbidden_error, not_found_error, validation_error, AppError, AppResult,
};
use crate::utils::validation::{into_result, normalize_optional};

/// Roles que pueden consultar el directorio de usuarios
const DIRECTORY_ROLES: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Manager, Role::TeamLeader];

/// Coste de bcrypt (mínimo en tests unitarios)
#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, HASH_COST).map_err(|e| AppError::Hash(format!("Error hashing password: {}", e)))
}

pub struct UserService {
    store: SharedStore,
}

impl UserService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, identity: &Identity, request: CreateUserRequest) -> AppResult<UserResponse> {
        ensure_role(identity, &ADMIN_ROLES, "create user")?;

        let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);
        let role = match request.role.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                errors.add("role", field_error("enum", e.to_string()));
                None
            }
        };
        into_result(errors)?;

        let Some(role) = role else {
            return Err(validation_error("role", "enum", "role is required"));
        };
        if role == Role::SuperAdmin && !identity.has_role(Role::SuperAdmin) {
            return Err(forbidden_error(
                "create user",
                "only a super admin can create super admins",
            ));
        }

        let email = request.email.trim().to_lowercase();
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(conflict_error("User", "email", &email));
        }

        let user = self
            .store
            .create_user(NewUser {
                name: request.name.trim().to_string(),
                email,
                password_hash: hash_password(&request.password)?,
                role,
                country: normalize_optional(request.country),
            })
            .await?;

        self.store
            .append_activity(NewActivity::user_created(user.id, role.as_str(), identity.id))
            .await?;
        tracing::info!("User {} created with role {} by user {}", user.id, role, identity.id);

        Ok(UserResponse::from(user))
    }

    pub async fn list_users(&self, identity: &Identity) -> AppResult<Vec<UserResponse>> {
        ensure_role(identity, &DIRECTORY_ROLES, "list users")?;

        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn create_team(&self, identity: &Identity, request: CreateTeamRequest) -> AppResult<TeamResponse> {
        ensure_role(identity, &ADMIN_ROLES, "create team")?;
        request.validate()?;

        match self.store.find_user(request.leader_id).await? {
            Some(user) if user.role == Role::TeamLeader => {}
            Some(_) => {
                return Err(validation_error(
                    "leaderId",
                    "leader_role",
                    "team leader must have role TEAM_LEADER",
                ))
            }
            None => return Err(not_found_error("User", request.leader_id)),
        }

        let team = self
            .store
            .create_team(
                request.name.trim().to_string(),
                normalize_optional(request.country),
                request.leader_id,
            )
            .await?;

        self.store
            .append_activity(NewActivity::team_updated(
                team.id,
                identity.id,
                json!({ "name": team.name, "leaderId": team.leader_id }),
            ))
            .await?;
        tracing::info!("Team {} created with leader {}", team.id, team.leader_id);

        Ok(TeamResponse {
            team,
            member_ids: Vec::new(),
        })
    }

    pub async fn get_team(&self, identity: &Identity, team_id: i64) -> AppResult<TeamResponse> {
        let team = self
            .store
            .find_team(team_id)
            .await?
            .ok_or_else(|| not_found_error("Team", team_id))?;

        let is_leader = team.leader_id == identity.id;
        if !is_leader && !identity.role.map_or(false, |role| role.is_elevated()) {
            return Err(forbidden_error("read team", "not your team"));
        }

        let member_ids = self.store.team_member_ids(team.id).await?;
        Ok(TeamResponse { team, member_ids })
    }

    pub async fn add_team_member(
        &self,
        identity: &Identity,
        team_id: i64,
        request: AddTeamMemberRequest,
    ) -> AppResult<TeamResponse> {
        ensure_role(identity, &ADMIN_ROLES, "add team member")?;

        let team = self
            .store
            .find_team(team_id)
            .await?
            .ok_or_else(|| not_found_error("Team", team_id))?;

        let user = self
            .store
            .find_user(request.user_id)
            .await?
            .ok_or_else(|| not_found_error("User", request.user_id))?;
        if !user.role.can_own_leads() {
            return Err(validation_error(
                "userId",
                "member_role",
                "team members must be COUNSELOR or TEAM_LEADER",
            ));
        }

        self.store.add_team_member(team.id, user.id).await?;
        self.store
            .append_activity(NewActivity::team_updated(
                team.id,
                identity.id,
                json!({ "addedUserId": user.id }),
            ))
            .await?;

        let member_ids = self.store.team_member_ids(team.id).await?;
        Ok(TeamResponse { team, member_ids })
    }
}
