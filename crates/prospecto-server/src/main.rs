mod api;
mod middleware;
mod sessions;

use std::sync::Arc;
use std::time::Duration;

use prospecto_analysis::{Analyzer, GeminiClient};
use prospecto_geo::GeoClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::RateLimitState,
    sessions::SessionStore,
};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(prospecto_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if config.google_maps_api_key.is_none() {
        tracing::warn!("GOOGLE_MAPS_API_KEY not set; nearby search will report a configuration error");
    }
    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; enrichment will report a configuration error");
    }

    let geo = Arc::new(GeoClient::from_config(&config)?);
    let model = Arc::new(GeminiClient::from_config(&config)?);
    let analyzer = Analyzer::new(geo.clone(), geo.clone(), model);

    let sessions = SessionStore::new(config.session_ttl_secs);
    spawn_session_sweeper(sessions.clone());

    let state = AppState {
        analyzer,
        address_search: geo,
        sessions,
    };
    let app = build_app(state, RateLimitState::per_minute(config.rate_limit_per_minute));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "prospecto-server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

fn spawn_session_sweeper(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.sweep_expired(chrono::Utc::now()).await;
            if removed > 0 {
                tracing::info!(removed, "expired sessions swept");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
