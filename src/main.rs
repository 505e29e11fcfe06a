use std::net::SocketAddr;

use chartink_bridge::{AppState, config, routes};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load();
    let state = AppState::from_settings(settings.clone());

    let ip = match settings.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::error!("invalid HOST {:?}: {e}", settings.host);
            std::process::exit(1);
        }
    };
    let addr = SocketAddr::from((ip, settings.port));

    tracing::info!("chartink webhook server starting");
    tracing::info!("server url: http://localhost:{}", settings.port);
    tracing::info!("webhook endpoint: http://localhost:{}/webhook", settings.port);
    tracing::info!("download endpoint: http://localhost:{}/download", settings.port);
    tracing::info!("workbook file: {}", settings.workbook_path.display());
    tracing::info!(
        "google drive: {}",
        if state.uploader.is_available() { "enabled" } else { "disabled" }
    );

    let app = routes::app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
