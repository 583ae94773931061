use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// CallLog - mapea a la tabla call_logs. Inmutable una vez creado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    pub id: i64,
    pub lead_id: i64,
    pub user_id: i64,
    pub duration_seconds: i32,
    pub outcome: String,
    pub notes: Option<String>,
    pub called_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCallLog {
    pub lead_id: i64,
    pub user_id: i64,
    pub duration_seconds: i32,
    pub outcome: String,
    pub notes: Option<String>,
    pub called_at: DateTime<Utc>,
}
