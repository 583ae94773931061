//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL definido en `migrations/`.

pub mod activity;
pub mod auth;
pub mod call_log;
pub mod lead;
pub mod note;
pub mod qualification;
pub mod sla;
pub mod user;
