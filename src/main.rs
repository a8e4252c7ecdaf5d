mod api;
mod config;
mod engine;
mod error;
mod geo;
mod models;
mod observability;
mod pricing;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::store::{MemoryStore, StoreSeed};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store = Arc::new(load_store(config.seed_file.as_deref())?);

    let (app_state, job_rx) = state::AppState::new(
        store,
        config.job_queue_size,
        config.event_buffer_size,
        config.alternative_date_window,
    );
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::queue::run_assignment_worker(
        shared_state.clone(),
        job_rx,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

fn load_store(seed_file: Option<&str>) -> Result<MemoryStore, error::AppError> {
    let Some(path) = seed_file else {
        tracing::info!("no seed file configured, starting with an empty store");
        return Ok(MemoryStore::new());
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|err| error::AppError::Internal(format!("failed to read {path}: {err}")))?;
    let seed: StoreSeed = serde_json::from_str(&raw)
        .map_err(|err| error::AppError::Internal(format!("invalid seed file {path}: {err}")))?;

    let store = MemoryStore::from_seed(seed);
    tracing::info!(
        seed_file = path,
        schedules = store.schedule_count(),
        bookings = store.booking_count(),
        "store seeded"
    );
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
