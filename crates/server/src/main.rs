use std::path::PathBuf;

use anyhow::Context;
use server::{DeploymentImpl, routes};
use services::services::{config::Config, database_validator::DatabaseValidator};
use tokio::{net::TcpListener, signal::ctrl_c};
use tracing::{error, info};
use utils::{assets::asset_dir, logging::init_tracing, sentry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let sentry_dsn = std::env::var("SENTRY_DSN").ok();
    let _sentry_guard = sentry::init_once(sentry_dsn.as_deref());
    init_tracing(_sentry_guard.is_some());

    let config_path = match std::env::var("BOOKING_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => asset_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path).context("loading configuration")?;

    let deployment = DeploymentImpl::new(config)
        .await
        .context("initializing deployment")?;
    let validation = DatabaseValidator::new(deployment.db().pool.clone())
        .ensure_ready()
        .await
        .context("validating database")?;
    info!("{}", validation.summary());

    let server = &deployment.config().server;
    let address = format!("{}:{}", server.host, server.port);
    info!(
        therapist_scoping = deployment.config().scoping_enabled(),
        "Booking rules loaded"
    );

    let app = routes::router(deployment);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
