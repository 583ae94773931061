//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! de entrada y conversión de códigos enumerados.

use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;
use validator::{ValidationError, ValidationErrors};

use crate::utils::errors::field_error;

lazy_static! {
    /// Teléfono internacional: `+` opcional, dígitos, espacios, guiones o paréntesis
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 ()\-]{6,19}$").unwrap();
}

/// Validar que un string no esté vacío (ignora espacios)
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("not_blank", "must not be blank"));
    }
    Ok(())
}

/// Recortar y descartar strings vacíos
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Forma canónica del teléfono usada como clave de deduplicación
pub fn normalize_phone(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if value.trim_start().starts_with('+') {
        format!("+{}", digits)
    } else {
        digits
    }
}

/// Convertir un código enumerado, acumulando el error sobre `field`
pub fn parse_code<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: &str,
) -> Option<T>
where
    T: FromStr<Err = String>,
{
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(message) => {
            let mut error = field_error("enum", message);
            error.add_param("value".into(), &raw);
            errors.add(field, error);
            None
        }
    }
}

/// Devuelve `Err` si se acumuló algún error
pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
