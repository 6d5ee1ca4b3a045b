mod config;
mod dto;
mod handlers;
mod lifecycle;
mod models;
mod repository;
mod service;

use std::sync::Arc;

use handlers::rest;

use tower_http::trace::TraceLayer;

use service::NoteService;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt::init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load configuration: {e}");
        panic!("failed to load configuration: {e}");
    });

    // Store creation and schema initialisation
    let store = repository::open(&cfg.database_url, cfg.max_connections)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to establish database connection: {e}");
            panic!("failed to establish database connection: {e}");
        });

    lifecycle::startup(store.as_ref()).await.unwrap_or_else(|e| {
        tracing::error!("Failed to initialise database schema: {e}");
        panic!("failed to initialise database schema: {e}");
    });

    // Service creation
    let service = Arc::new(NoteService::new(store.clone()));

    // Router config
    let router = rest::router(service).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind to {}: {e}", cfg.bind_addr);
            panic!("failed to bind to {}: {e}", cfg.bind_addr);
        });

    match listener.local_addr() {
        Ok(addr) => tracing::info!("Notes API listening on {}", addr),
        Err(_) => tracing::info!("Notes API listening on {}", cfg.bind_addr),
    }

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(lifecycle::shutdown_signal())
        .await
    {
        tracing::error!("HTTP server error: {e}");
    }

    lifecycle::shutdown(store.as_ref()).await;
}
