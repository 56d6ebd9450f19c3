use gh_pulse::{AppState, Config, LocalStore, router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store = LocalStore::open(config.data_path.clone())
        .await
        .map_err(|err| err.message)?;
    let state = AppState::new(&config, store).map_err(|err| err.message)?;

    if config.github_token.is_none() {
        info!("GITHUB_TOKEN not set, using unauthenticated GitHub API limits");
    }
    info!("forwarding GitHub requests to {}", state.github.base_url());

    let refresher = state.dashboard.clone().spawn_auto_refresh(config.auto_refresh);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresher.abort();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
