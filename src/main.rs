use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use admissions_crm::config::EnvironmentConfig;
use admissions_crm::database::{connect_store, seed_store};
use admissions_crm::repositories::{MemoryStore, SharedStore};
use admissions_crm::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("admissions_crm=info,tower_http=info")),
        )
        .init();

    info!("🚀 Iniciando CRM de admisiones...");

    let config = EnvironmentConfig::from_env()?;
    info!("⚙️ Entorno: {}", config.environment);

    let store: SharedStore = match &config.database {
        Some(database) => Arc::new(connect_store(database).await?),
        None => {
            warn!("⚠️ DATABASE_URL no definida, usando almacenamiento en memoria");
            Arc::new(MemoryStore::new())
        }
    };

    seed_store(&store, config.seed_demo_data).await?;

    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_router(AppState::new(store, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   POST /api/auth/login - Login");
    info!("   GET  /api/auth/me - Identidad actual");
    info!("📇 Leads:");
    info!("   GET|POST /api/leads - Listar / crear leads");
    info!("   POST /api/leads/reassign - Reasignación masiva");
    info!("   GET|DELETE /api/leads/:id - Detalle / borrar lead");
    info!("   PATCH /api/leads/:id/stage - Cambiar etapa");
    info!("   POST /api/leads/:id/inbound - Mensaje entrante");
    info!("   GET|POST /api/leads/:id/notes|calls|qualifications");
    info!("   GET  /api/leads/:id/activities|sla");
    info!("⏱️ SLA y dashboard:");
    info!("   GET|PUT /api/sla/config - Configuración de SLA");
    info!("   GET  /api/sla/breaches - Alertas de SLA");
    info!("   GET  /api/dashboard/summary - Resumen");
    info!("   GET  /api/activities - Feed de actividad");
    info!("👥 Usuarios y equipos:");
    info!("   GET|POST /api/users, POST /api/teams, GET /api/teams/:id");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
