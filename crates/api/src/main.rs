use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pitchcraft_api::background::session_cleanup;
use pitchcraft_api::config::{DatabaseConfig, ServerConfig};
use pitchcraft_api::router::build_app_router;
use pitchcraft_api::state::AppState;
use pitchcraft_db::DbPool;

/// Startup connection attempts before giving up on the database.
const DB_CONNECT_ATTEMPTS: u32 = 3;
const DB_CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = connect_with_retry(&config.database).await?;
    tracing::info!("Database connection pool created");

    pitchcraft_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    pitchcraft_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    // --- Background jobs ---
    let cancel = CancellationToken::new();
    let cleanup = tokio::spawn(session_cleanup::run(pool.clone(), cancel.clone()));

    // --- Router ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cancel.cancel();
    if let Err(e) = cleanup.await {
        tracing::error!(error = %e, "Session cleanup task panicked");
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pitchcraft_api=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn connect_with_retry(config: &DatabaseConfig) -> anyhow::Result<DbPool> {
    let settings = config.pool_settings();
    let mut attempt = 1;
    loop {
        match pitchcraft_db::create_pool(&config.url, &settings).await {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < DB_CONNECT_ATTEMPTS => {
                tracing::warn!(attempt, error = %e, "Database connection failed, retrying");
                tokio::time::sleep(DB_CONNECT_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).context(format!(
                    "Failed to connect to database after {DB_CONNECT_ATTEMPTS} attempts"
                ))
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
