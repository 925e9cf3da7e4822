use std::sync::Arc;

use bike_tracker::config::TrackerConfig;
use bike_tracker::stations::{BikeSystems, HttpFetcher, HttpFetcherConfig};
use bike_tracker::sync::{RefreshPolicy, SyncSettings, Synchronizer, spawn_background_refresh};
use bike_tracker::web::{AppState, create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load config: file from BIKE_TRACKER_CONFIG if set, otherwise defaults
    let mut config = match std::env::var("BIKE_TRACKER_CONFIG") {
        Ok(path) => TrackerConfig::load(&path).expect("Failed to load config"),
        Err(_) => TrackerConfig::default(),
    };
    if let Ok(addr) = std::env::var("BIKE_TRACKER_ADDR") {
        let addr = addr.parse().expect("Invalid BIKE_TRACKER_ADDR");
        config = config.with_bind_addr(addr);
    }
    config.validate().expect("Invalid configuration");
    tracing::info!(systems = config.systems.len(), "Loaded configuration");

    let systems = Arc::new(
        BikeSystems::from_config(&config.systems).expect("Invalid bike system configuration"),
    );

    let fetcher = HttpFetcher::new(HttpFetcherConfig::from_refresh(&config.refresh))
        .expect("Failed to create HTTP client");
    let synchronizer = Arc::new(Synchronizer::new(
        fetcher,
        SyncSettings::from_refresh(&config.refresh),
    ));

    // Background refresh; the first pass starts immediately
    let background = spawn_background_refresh(
        systems.clone(),
        synchronizer.clone(),
        config.refresh.background_interval(),
    );

    let refresh = RefreshPolicy::new(synchronizer, config.refresh.cache_ttl());
    let app = create_router(AppState::new(systems, refresh));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!(addr = %config.bind_addr, "YouBike tracker listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    background.shutdown().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
