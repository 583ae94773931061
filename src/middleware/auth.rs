//! Middleware de autenticación JWT
//!
//! Verifica el token Bearer, construye la [`Identity`] explícita del usuario
//! y la inyecta en las extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    models::auth::Identity,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.jwt)?;
    let identity: Identity = state.auth_service().identity_from_claims(&claims).await?;

    tracing::debug!(
        "Authenticated user {} with role {:?}",
        identity.id,
        identity.role
    );

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
