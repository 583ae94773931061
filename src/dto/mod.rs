//! Objetos de transferencia de la API REST

pub mod auth_dto;
pub mod common_dto;
pub mod dashboard_dto;
pub mod engagement_dto;
pub mod lead_dto;
pub mod sla_dto;
pub mod user_dto;
