//! Extractores `Json` y `Query` con rechazos en el formato de `AppError`
//!
//! Los errores de deserialización se devuelven como `VALIDATION_ERROR` con el
//! campo culpable en `params.field`; el resto (JSON mal formado, falta de
//! `Content-Type`) como `BAD_REQUEST`.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, Uri},
    Json,
};
use serde::de::DeserializeOwned;
use validator::ValidationErrors;

use super::errors::{field_error, AppError};

/// Cuerpo JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// Parámetros de la query string
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(JsonRejection::JsonDataError(rejection)) => {
                let message = rejection.body_text();
                let field = json_error_path(&message).unwrap_or_else(|| "body".to_string());
                Err(deserialize_error("body", field, message))
            }
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::try_from_uri(&parts.uri) {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => {
                let message = rejection.body_text();
                let field = failing_query_param::<T>(&parts.uri)
                    .or_else(|| missing_field(&message))
                    .unwrap_or_else(|| "query".to_string());
                Err(deserialize_error("query", field, message))
            }
        }
    }
}

fn deserialize_error(key: &'static str, field: String, message: String) -> AppError {
    let mut error = field_error("deserialize", message);
    error.add_param("field".into(), &field);

    let mut errors = ValidationErrors::new();
    errors.add(key, error);
    AppError::Validation(errors)
}

/// Ruta del valor inválido: `"...: leadIds[0]: invalid type..."` da `leadIds[0]`
fn json_error_path(message: &str) -> Option<String> {
    let is_path = |segment: &str| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '[' | ']' | '_'))
    };

    message
        .split(": ")
        .nth(1)
        .filter(|segment| is_path(segment))
        .map(str::to_string)
        .or_else(|| missing_field(message))
}

/// Nombre entre comillas invertidas en "missing field `x`"
fn missing_field(message: &str) -> Option<String> {
    let rest = message.split("missing field `").nth(1)?;
    rest.split('`').next().map(str::to_string)
}

/// Primer parámetro que por sí solo no deserializa
fn failing_query_param<T: DeserializeOwned>(uri: &Uri) -> Option<String> {
    uri.query()?
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find(|pair| {
            format!("/?{}", pair)
                .parse::<Uri>()
                .map_or(false, |single| Query::<T>::try_from_uri(&single).is_err())
        })
        .map(|pair| pair.split('=').next().unwrap_or(pair).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_path_reads_nested_index() {
        let message = "Failed to deserialize the JSON body into the target type: leadIds[0]: \
                       invalid type: string \"x\", expected i64 at line 1 column 14";
        assert_eq!(json_error_path(message).as_deref(), Some("leadIds[0]"));
    }

    #[test]
    fn test_json_error_path_falls_back_to_missing_field() {
        let message = "Failed to deserialize the JSON body into the target type: \
                       missing field `stage` at line 1 column 2";
        assert_eq!(json_error_path(message).as_deref(), Some("stage"));
        assert_eq!(json_error_path("invalid type: sequence, expected struct"), None);
    }

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Filters {
        stage: Option<crate::models::lead::Stage>,
        limit: Option<i64>,
    }

    #[test]
    fn test_failing_query_param_names_the_bad_key() {
        let uri: Uri = "/api/leads?limit=10&stage=WON".parse().unwrap();
        assert_eq!(failing_query_param::<Filters>(&uri).as_deref(), Some("stage"));

        let uri: Uri = "/api/leads?limit=ten".parse().unwrap();
        assert_eq!(failing_query_param::<Filters>(&uri).as_deref(), Some("limit"));

        let uri: Uri = "/api/leads?limit=10".parse().unwrap();
        assert_eq!(failing_query_param::<Filters>(&uri), None);
    }
}
