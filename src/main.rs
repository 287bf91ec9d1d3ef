use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use dotenvy::dotenv;

use fleet_reminders::cache::{CacheConfig, RedisClient};
use fleet_reminders::config::{DatabaseConfig, EnvironmentConfig};
use fleet_reminders::database::DatabaseConnection;
use fleet_reminders::metrics::Metrics;
use fleet_reminders::repositories::PgServiceReminderRepository;
use fleet_reminders::routes::create_app;
use fleet_reminders::services::{
    LocalSyncLease, RedisSyncLease, ReminderSyncJob, ServiceReminderSyncService, SyncLease,
};
use fleet_reminders::state::AppState;
use fleet_reminders::utils::SystemClock;

const SYNC_LEASE_NAME: &str = "service_reminder_sync";

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    info!("🔧 Fleet Reminders - Sincronización de recordatorios de mantenimiento");
    info!("🌍 Entorno: {}", config.environment);
    info!("================================================");

    // Inicializar base de datos
    let database_config = DatabaseConfig::from_env()?;
    let db_connection = match DatabaseConnection::new(&database_config).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    let pool = db_connection.pool().clone();

    // Lease de sincronización: Redis si está configurado, local si no
    let lease: Arc<dyn SyncLease> = match &config.redis_url {
        Some(redis_url) => {
            let cache_config = CacheConfig {
                redis_url: redis_url.clone(),
                default_ttl: config.reminder_sync_lease_ttl_secs,
                ..CacheConfig::default()
            };
            match RedisClient::new(cache_config).await {
                Ok(client) => {
                    info!("✅ Redis conectado, lease de sincronización compartido");
                    Arc::new(RedisSyncLease::new(client, SYNC_LEASE_NAME))
                }
                Err(e) => {
                    error!("❌ Error conectando a Redis: {}", e);
                    return Err(anyhow::anyhow!("Error de Redis: {}", e));
                }
            }
        }
        None => {
            warn!("⚠️ REDIS_URL no definido, usando lease local al proceso");
            Arc::new(LocalSyncLease::new())
        }
    };

    let metrics = Arc::new(Metrics::new()?);
    let repository = Arc::new(PgServiceReminderRepository::new(pool));
    let sync_service = Arc::new(
        ServiceReminderSyncService::new(repository, Arc::new(SystemClock), lease)
            .with_metrics(metrics.clone()),
    );

    // Job periódico
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let job = ReminderSyncJob::new(
        sync_service.clone(),
        Duration::from_secs(config.reminder_sync_interval_secs),
        config.reminder_sync_on_startup,
    );
    let job_handle = tokio::spawn(job.run(shutdown_rx));

    let app = create_app(AppState::new(sync_service, metrics));

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   GET  /metrics - Métricas Prometheus");
    info!("   POST /api/service-reminders/sync - Sincronizar recordatorios");
    info!(
        "⏱️ Sincronización cada {}s (al arrancar: {})",
        config.reminder_sync_interval_secs, config.reminder_sync_on_startup
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Parar el job y cancelar la ejecución en curso, si la hay
    let _ = shutdown_tx.send(true);
    match job_handle.await {
        Ok(runs) => info!("🛑 Job de sincronización detenido tras {} ejecuciones", runs),
        Err(e) => error!("❌ El job de sincronización terminó con error: {}", e),
    }

    if let Err(e) = server_result {
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
