//! Modelo de Lead
//!
//! Este módulo contiene el struct Lead, sus enums de etapa y canal,
//! y los filtros de búsqueda. Mapea a la tabla leads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;

/// Etapa del embudo - mapea al ENUM lead_stage
///
/// No hay orden impuesto entre etapas: cualquier etapa puede pasar a cualquier otra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "lead_stage", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    New,
    Contacted,
    Qualified,
    Converted,
    Enrolled,
    Lost,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::New,
        Stage::Contacted,
        Stage::Qualified,
        Stage::Converted,
        Stage::Enrolled,
        Stage::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::New => "NEW",
            Stage::Contacted => "CONTACTED",
            Stage::Qualified => "QUALIFIED",
            Stage::Converted => "CONVERTED",
            Stage::Enrolled => "ENROLLED",
            Stage::Lost => "LOST",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::New => "New",
            Stage::Contacted => "Contacted",
            Stage::Qualified => "Qualified",
            Stage::Converted => "Converted",
            Stage::Enrolled => "Enrolled",
            Stage::Lost => "Lost",
        }
    }

    /// Fin suave del ciclo de vida
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Enrolled | Stage::Lost)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage '{}'", s))
    }
}

/// Canal de entrada del lead - mapea al ENUM lead_source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "lead_source")]
pub enum LeadSource {
    #[sqlx(rename = "WhatsApp")]
    #[serde(rename = "WhatsApp")]
    WhatsApp,
    #[sqlx(rename = "Facebook")]
    #[serde(rename = "Facebook")]
    Facebook,
    #[sqlx(rename = "Instagram")]
    #[serde(rename = "Instagram")]
    Instagram,
    #[sqlx(rename = "Website")]
    #[serde(rename = "Website")]
    Website,
    #[sqlx(rename = "Referral")]
    #[serde(rename = "Referral")]
    Referral,
    #[sqlx(rename = "Walk-in")]
    #[serde(rename = "Walk-in")]
    WalkIn,
    #[sqlx(rename = "Other")]
    #[serde(rename = "Other")]
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 7] = [
        LeadSource::WhatsApp,
        LeadSource::Facebook,
        LeadSource::Instagram,
        LeadSource::Website,
        LeadSource::Referral,
        LeadSource::WalkIn,
        LeadSource::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::WhatsApp => "WhatsApp",
            LeadSource::Facebook => "Facebook",
            LeadSource::Instagram => "Instagram",
            LeadSource::Website => "Website",
            LeadSource::Referral => "Referral",
            LeadSource::WalkIn => "Walk-in",
            LeadSource::Other => "Other",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown source '{}'", s))
    }
}

/// Lead principal - mapea exactamente a la tabla leads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub source: Option<LeadSource>,
    pub program: Option<String>,
    pub intake: Option<String>,
    pub budget: Option<Decimal>,
    pub stage: Stage,
    pub assigned_to_id: Option<i64>,
    pub created_by_id: Option<i64>,
    pub score: Option<i32>,
    pub last_inbound_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos ya validados para insertar un lead
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub source: Option<LeadSource>,
    pub program: Option<String>,
    pub intake: Option<String>,
    pub budget: Option<Decimal>,
    pub stage: Stage,
    pub assigned_to_id: Option<i64>,
    pub created_by_id: Option<i64>,
}

/// Filtros para búsqueda de leads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilters {
    pub stage: Option<Stage>,
    pub source: Option<LeadSource>,
    pub country: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl LeadFilters {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 500;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Aplica los filtros explícitos (sin paginación) a un lead
    pub fn matches(&self, lead: &Lead) -> bool {
        if self.stage.map_or(false, |stage| stage != lead.stage) {
            return false;
        }
        if self.source.map_or(false, |source| Some(source) != lead.source) {
            return false;
        }
        if let Some(country) = &self.country {
            if lead.country.as_deref() != Some(country.as_str()) {
                return false;
            }
        }
        if self
            .assigned_to_id
            .map_or(false, |owner| Some(owner) != lead.assigned_to_id)
        {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = |field: &Option<String>| {
                field
                    .as_deref()
                    .map_or(false, |value| value.to_lowercase().contains(&needle))
            };
            if !lead.name.to_lowercase().contains(&needle) && !hit(&lead.phone) && !hit(&lead.email) {
                return false;
            }
        }
        true
    }
}
