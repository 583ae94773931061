//! Helpers compartidos por los tests de integración

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use admissions_crm::config::EnvironmentConfig;
use admissions_crm::models::auth::Role;
use admissions_crm::models::user::{NewUser, User};
use admissions_crm::repositories::{MemoryStore, SharedStore, UserRepository};
use admissions_crm::utils::jwt::generate_token;
use admissions_crm::{create_router, AppState};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let config = EnvironmentConfig {
            jwt_secret: "integration-test-secret".to_string(),
            ..EnvironmentConfig::default()
        };
        let state = AppState::new(store, config);
        let router = create_router(state.clone());
        Self { state, router }
    }

    pub fn store(&self) -> &SharedStore {
        &self.state.store
    }

    /// Crea un usuario y devuelve su token
    pub async fn user(&self, role: Role, email: &str) -> (User, String) {
        let user = self
            .store()
            .create_user(NewUser {
                name: format!("Test {}", role.label()),
                email: email.to_string(),
                password_hash: "unused".to_string(),
                role,
                country: None,
            })
            .await
            .unwrap();
        let (token, _) = generate_token(&user, &self.state.jwt).unwrap();
        (user, token)
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }
}
