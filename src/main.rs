// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Soil-Service API Server
//!
//! Summarizes the soils inside a farm property boundary using USDA
//! soil survey data, caching results per polygon.

use soil_service::{
    config::{CacheBackendKind, Config},
    db::FirestoreDb,
    services::{CacheBackend, SdaClient, SoilCache, SoilService, SsurgoProvider},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Soil-Service API");

    // Initialize the summary cache
    let backend = match config.cache_backend {
        CacheBackendKind::Firestore => {
            CacheBackend::Firestore(FirestoreDb::new(&config.gcp_project_id).await?)
        }
        CacheBackendKind::Memory => {
            tracing::info!("Using in-memory soil cache");
            CacheBackend::Memory(Arc::new(dashmap::DashMap::new()))
        }
    };
    let cache = SoilCache::new(backend, config.soil_cache_ttl());
    tracing::info!(
        ttl_days = config.soil_cache_ttl_days,
        "Soil cache initialized"
    );

    // Register soil providers
    let sda = SdaClient::new(&config.sda_url, config.sda_timeout_secs);
    let service =
        SoilService::new(cache.clone()).with_provider(Arc::new(SsurgoProvider::new(sda)));
    tracing::info!(
        sda_url = %config.sda_url,
        providers = service.providers().len(),
        "Soil providers registered"
    );

    spawn_cache_sweep(cache, config.cache_sweep_interval_secs);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        soil_service: service,
    });

    // Build router
    let app = soil_service::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically delete expired cache entries. Reads already ignore them.
fn spawn_cache_sweep(cache: SoilCache, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            match cache.purge_expired().await {
                Ok(count) => tracing::info!(count, "Expired soil cache entries purged"),
                Err(e) => tracing::warn!(error = %e, "Soil cache sweep failed"),
            }
        }
    });
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), tracing_subscriber::filter::ParseError> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("soil_service=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
