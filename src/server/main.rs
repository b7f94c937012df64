use std::net::SocketAddr;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use aquafarm::config::get_config;
use aquafarm::errors::AppError;
use aquafarm::server::{build_router, AppState, Database};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Server failed: {e}");
        eprintln!("aquafarm_server: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = get_config()?;

    if config.logging.enabled {
        // RUST_LOG wins over the configured level when set.
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let db = Database::new().await?;
    db.ensure_schema().await?;

    let app = build_router(AppState::new(db.clone()));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Config(format!("failed to bind {bind_addr}: {e}")))?;

    info!(
        addr = %bind_addr,
        db_type = db.db_type(),
        "Aquafarm server listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::Config(format!("server error: {e}")))?;

    info!("Aquafarm server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
