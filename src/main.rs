//! Dispatch Hub server binary.
//!
//! Wires the Postgres-backed stores, the WebSocket fan-out layer, and
//! the HTTP API into one axum server.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dispatch_hub::adapters::http::{dispatch_routes, DispatchAppState};
use dispatch_hub::adapters::postgres::{
    PostgresAssignmentStore, PostgresGroupDirectory, PostgresInboxStore, PostgresIncidentStore,
};
use dispatch_hub::adapters::websocket::{
    websocket_router, ConnectionRegistry, FanoutPublisher, WebSocketState,
};
use dispatch_hub::application::{DispatchService, NotificationRecorder};
use dispatch_hub::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        production = config.is_production(),
        "dispatch-hub starting"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running pending migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // Live fan-out side.
    let registry = Arc::new(ConnectionRegistry::new(config.websocket.queue_capacity));
    let publisher = Arc::new(FanoutPublisher::new(Arc::clone(&registry)));

    // Durable side.
    let incidents = Arc::new(PostgresIncidentStore::new(pool.clone()));
    let assignments = Arc::new(PostgresAssignmentStore::new(pool.clone()));
    let inbox = Arc::new(PostgresInboxStore::new(pool.clone()));
    let directory = Arc::new(PostgresGroupDirectory::new(pool.clone()));
    let recorder = Arc::new(NotificationRecorder::new(directory, inbox));

    let service = Arc::new(DispatchService::new(
        incidents,
        assignments,
        publisher,
        recorder,
    ));

    let app = dispatch_routes(DispatchAppState::new(service))
        .merge(websocket_router().with_state(WebSocketState::new(registry)))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| origin.parse::<http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        // Dashboards are same-origin by default; opt in via config.
        CorsLayer::new()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}
