//! Conexión a PostgreSQL
//!
//! Crea el pool, aplica las migraciones de `migrations/` y devuelve el
//! almacén listo para usar.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::database::DatabaseConfig;
use crate::repositories::PgStore;

/// Conectar a la base de datos y aplicar migraciones pendientes
pub async fn connect_store(config: &DatabaseConfig) -> Result<PgStore> {
    info!("🗄️ Conectando a PostgreSQL en {}", config.masked_url());

    let pool = config
        .create_pool()
        .await
        .with_context(|| format!("failed to connect to {}", config.masked_url()))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    info!("✅ Migraciones aplicadas");
    Ok(PgStore::new(pool))
}
