// --- File: crates/services/agenda_backend/src/main.rs ---
use agenda_common::logging;
use agenda_config::load_config;
use agenda_db::{DbClient, SqlBookingStore};
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

mod app;

#[tokio::main]
async fn main() {
    logging::init();

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load config: {}", e);
            process::exit(1);
        }
    };

    let client = match DbClient::new(&config).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to the database: {}", e);
            process::exit(1);
        }
    };

    let store = Arc::new(SqlBookingStore::new(client));
    if let Err(e) = store.init_schema().await {
        error!("Failed to initialise the schema: {}", e);
        process::exit(1);
    }

    let app = app::build_app(config.clone(), store.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            process::exit(1);
        }
    };
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    store.client().close().await;
    info!("Database pool closed, bye");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutdown signal received");
}
