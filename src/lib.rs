//! CRM de admisiones
//!
//! API REST para captación y seguimiento de leads: control de acceso por rol,
//! reasignación masiva, auditoría y alertas de SLA.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
