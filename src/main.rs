use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use viewcomfy_proxy::{api, config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    config::Config::dotenv_load();
    let config = config::Config::new();
    config::Config::log_env_vars();

    let state = Arc::new(api::routes::AppState::from_config(&config));
    tracing::info!(inputs_dir = %config.comfy_inputs_dir.display(), "uploads land in ComfyUI inputs");
    let app = api::routes::router(state);

    let ip: std::net::IpAddr = config.api_host.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", config.api_host);
        std::net::IpAddr::from([127, 0, 0, 1])
    });
    let port: u16 = config.api_port.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 3000", config.api_port);
        3000
    });
    let socket_address = SocketAddr::new(ip, port);
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
