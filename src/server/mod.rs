//! Web front end: prediction form, training trigger, health check

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::{render_index, TRAIN_SUCCESS};
pub use state::AppState;

use crate::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Bind address of the web server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&AppConfig> for ServerConfig {
    fn from(app: &AppConfig) -> Self {
        Self {
            host: app.host.clone(),
            port: app.port,
        }
    }
}

/// Start the server and block until ctrl+c
pub async fn run_server(app: AppConfig) -> anyhow::Result<()> {
    let config = ServerConfig::from(&app);
    let start_time = chrono::Utc::now();
    info!(
        data_dir = %app.data_dir.display(),
        bucket_dir = %app.bucket_dir.display(),
        started_at = %start_time.to_rfc3339(),
        "Initializing server directories"
    );
    std::fs::create_dir_all(&app.data_dir)?;
    std::fs::create_dir_all(&app.bucket_dir)?;

    let state = Arc::new(AppState::new(app));
    if !state.registry.is_model_present(&state.config.model_key)? {
        warn!(key = %state.config.model_key, "No production model yet; call /train first");
    }
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening");
    info!(url = %format!("http://{}", addr), "Prediction form available");
    info!(url = %format!("http://{}/train", addr), "Training endpoint available");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_app() {
        let mut app = AppConfig::default();
        app.host = "127.0.0.1".to_string();
        app.port = 5001;
        let config = ServerConfig::from(&app);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5001);
    }
}
