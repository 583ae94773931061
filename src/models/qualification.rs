use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

pub const HOT_THRESHOLD: i32 = 70;
pub const WARM_THRESHOLD: i32 = 40;

/// Categoría derivada del score - mapea al ENUM qualification_category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "qualification_category")]
pub enum QualificationCategory {
    Hot,
    Warm,
    Cold,
}

impl QualificationCategory {
    pub fn from_score(score: i32) -> Self {
        if score >= HOT_THRESHOLD {
            QualificationCategory::Hot
        } else if score >= WARM_THRESHOLD {
            QualificationCategory::Warm
        } else {
            QualificationCategory::Cold
        }
    }
}

/// Resultado de calificación - mapea a la tabla lead_qualifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    pub id: i64,
    pub lead_id: i64,
    pub score: i32,
    pub category: QualificationCategory,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}
