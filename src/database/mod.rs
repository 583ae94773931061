//! Módulo de base de datos
//!
//! Conexión a PostgreSQL, migraciones y datos iniciales.

pub mod connection;
pub mod seed;

pub use connection::connect_store;
pub use seed::seed_store;
