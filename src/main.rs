use availability_dashboard::{controller, router, AppState, DashboardConfig};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = DashboardConfig::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config)?;

    info!(backend = %state.backend.base_url(), "loading initial availability");
    let startup = state.clone();
    tokio::spawn(async move { controller::initial_load(&startup).await });

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
