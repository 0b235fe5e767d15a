//! Rental Marketplace Web - guest and admin web layer

use anyhow::Result;
use rental_marketplace_web::{web, AppConfig, BackendKind, HttpVendorApi, InMemoryVendorApi, VendorApi};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CART_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = AppConfig::from_env()?;
    let api: Arc<dyn VendorApi> = match config.backend {
        BackendKind::Http => {
            tracing::info!(base_url = %config.api.base_url, "using marketplace backend");
            Arc::new(HttpVendorApi::new(&config.api)?)
        }
        BackendKind::Memory => {
            tracing::warn!("using in-process backend; orders are lost on restart");
            Arc::new(InMemoryVendorApi::new())
        }
    };
    let shutdown = CancellationToken::new();
    let state = web::AppState::new(api, &config.currency).with_shutdown(shutdown.clone());
    let sweeper = state.carts.spawn_eviction(
        chrono::Duration::minutes(config.cart_ttl_mins), CART_SWEEP_INTERVAL, shutdown.clone(),
    );
    let app = web::router(state);

    tracing::info!("Rental marketplace web listening on 0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown.clone())).await?;
    shutdown.cancel();
    sweeper.await?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
    shutdown.cancel();
}
