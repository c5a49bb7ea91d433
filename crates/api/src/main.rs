use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bazaar_api::config::ServerConfig;
use bazaar_api::notifications::NotificationRouter;
use bazaar_api::router::build_app_router;
use bazaar_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_api=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = bazaar_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    bazaar_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    bazaar_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Uploads ---
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.upload_dir.display()))?;

    // --- Event bus ---
    let event_bus = Arc::new(bazaar_events::EventBus::default());
    let router_handle = tokio::spawn(NotificationRouter::new(pool.clone()).run(event_bus.subscribe()));
    tracing::info!("Notification router started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Dropping the last sender closes the channel and ends the router loop.
    // The app state clones died with the server.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), router_handle).await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM on Unix.
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
            Ok(mut sig) => {
                sig.recv().await;
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
