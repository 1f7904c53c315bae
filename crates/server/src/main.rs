use anyhow::Context;
use db::LogStore;
use server::{AppState, config::ServerConfig, file_logging, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    // The guard must be held for the lifetime of the application to ensure logs are flushed
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _file_log_guard = file_logging::init_logging(&log_level);

    let config = ServerConfig::from_env().context("invalid configuration")?;

    let store = LogStore::open(&config.database_path)
        .await
        .context("failed to open log store")?;
    store.init().await.context("failed to initialize schema")?;

    let bind_address = config.bind_address();
    let ui_auth = config.ui_credentials.is_some();
    let app_router = router(AppState::new(store.clone(), config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    let local_addr = listener.local_addr()?;

    tracing::info!(%local_addr, ui_auth, "Server running on http://{}", local_addr);

    axum::serve(listener, app_router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Running final WAL checkpoint and closing database...");
    if let Err(e) = store.close().await {
        tracing::warn!("Failed to close log store cleanly: {}", e);
    } else {
        tracing::info!("Log store closed");
    }

    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
            } else {
                tracing::error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}
