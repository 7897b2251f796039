use anyhow::Result;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Config,
    handlers::{self, AppState},
    metrics,
    table::TableCache,
};

/// Start the advisor server
///
/// This function:
/// 1. Initializes metrics
/// 2. Loads the gold table (fail-fast when the file is missing)
/// 3. Creates the Axum application
/// 4. Binds to the configured address
/// 5. Serves requests with graceful shutdown support
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics());

    let app_state = AppState {
        config: Arc::new(config.clone()),
        tables: Arc::new(TableCache::new()),
    };

    // A missing gold file halts startup before any request is served
    let table = app_state.tables.get_or_load(&config.data.gold_path)?;
    info!(
        "Gold table ready: {} rows, {} markets, {} dates",
        table.len(),
        table.markets().len(),
        table.dates().len()
    );

    let app = create_router(app_state, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting Bake Advisor on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    app_state: AppState,
    metrics_handle: Arc<PrometheusHandle>,
) -> Router {
    let api_routes = Router::new()
        .route("/api/advice", get(handlers::advice::get_advice))
        .route("/api/markets", get(handlers::selectors::list_markets))
        .route("/api/dates", get(handlers::selectors::list_dates))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(app_state);

    Router::new()
        // Public endpoints without table access
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics_handler::export_metrics))
        .with_state(metrics_handle)
        .merge(api_routes)
        // The presentation layer is served from another origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections...");
}
