//! Configuración y estados de SLA

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Umbrales por defecto sembrados en la base de datos
pub const DEFAULT_RESPONSE_MINUTES: i32 = 60;
pub const DEFAULT_ESCALATE_MINUTES: i32 = 120;

/// SlaConfig - registro único de la tabla sla_config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SlaConfig {
    /// Umbral de advertencia
    pub response_minutes: i32,
    /// Umbral de incumplimiento
    pub escalate_minutes: i32,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            response_minutes: DEFAULT_RESPONSE_MINUTES,
            escalate_minutes: DEFAULT_ESCALATE_MINUTES,
        }
    }
}

/// Estado derivado del reloj de respuesta. El orden de las variantes es el
/// orden de progresión: el estado solo empeora mientras pasa el tiempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaStatus {
    OnTime,
    Warning,
    Breached,
}

/// Resultado de evaluar un lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaEvaluation {
    pub lead_id: i64,
    pub status: SlaStatus,
    pub elapsed_minutes: i64,
    pub anchor: DateTime<Utc>,
}
