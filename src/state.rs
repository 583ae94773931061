//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use crate::config::environment::EnvironmentConfig;
use crate::repositories::SharedStore;
use crate::services::{
    ActivityService, AssignmentService, AuthService, DashboardService, EngagementService, LeadService, SlaService,
    UserService,
};
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub config: EnvironmentConfig,
    pub jwt: JwtConfig,
}

impl AppState {
    pub fn new(store: SharedStore, config: EnvironmentConfig) -> Self {
        let jwt = JwtConfig::from(&config);
        Self { store, config, jwt }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.store.clone(), self.jwt.clone())
    }

    pub fn lead_service(&self) -> LeadService {
        LeadService::new(self.store.clone())
    }

    pub fn assignment_service(&self) -> AssignmentService {
        AssignmentService::new(self.store.clone())
    }

    pub fn engagement_service(&self) -> EngagementService {
        EngagementService::new(self.store.clone())
    }

    pub fn activity_service(&self) -> ActivityService {
        ActivityService::new(self.store.clone())
    }

    pub fn sla_service(&self) -> SlaService {
        SlaService::new(self.store.clone())
    }

    pub fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(self.store.clone())
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.store.clone())
    }
}
