//! HTTP server setup and configuration
//!
//! This module provides the main server startup logic, routing configuration,
//! and graceful shutdown handling for the gateway.

use axum::{
    handler::HandlerWithoutStateExt,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

use crate::{
    config::SystemConfig,
    execution::CommandExecutor,
    http::handlers::*,
    types::Result,
};

/// Start the HTTP server with the given configuration
#[instrument(skip_all)]
pub async fn start_server(
    system_config: SystemConfig,
    executor: CommandExecutor,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = parse_listen_address(&system_config.server.listen)?;

    let app_state = Arc::new(AppState::new(system_config, executor));

    info!(
        hosts = app_state.executor.registry().len(),
        workflows = app_state.deployment_manager.workflow_names().count(),
        "Gateway state initialized"
    );

    if app_state.executor.registry().is_empty() {
        warn!("No hosts registered; fleet status will report no nodes");
    }

    let router = create_router(app_state.clone());

    info!(
        listen_addr = %addr,
        request_timeout = app_state.system_config.server.request_timeout,
        "Starting HTTP server"
    );

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!(
            error = %e,
            addr = %addr,
            "Failed to bind to address"
        );
        crate::types::Error::Io(e)
    })?;

    info!(
        local_addr = %listener.local_addr().unwrap_or(addr),
        "HTTP server listening"
    );

    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        shutdown_signal.await;
        info!("Shutdown signal received, starting graceful shutdown");
    });

    if let Err(e) = server.await {
        error!(error = %e, "HTTP server error");
        return Err(crate::types::Error::Io(e));
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Create the Axum router with all endpoints and middleware
pub(crate) fn create_router(app_state: Arc<AppState>) -> Router {
    let config = app_state.system_config.clone();

    let api_routes = Router::new()
        .route("/api/ssh", post(handle_ssh))
        .route("/api/ssh/batch", post(handle_batch))
        .route("/api/nodes/status", get(handle_nodes_status))
        .route("/api/docker/status", post(handle_docker_status))
        .route("/api/deploy", post(handle_deploy))
        .route("/api/migrate/memory", post(handle_migrate_memory))
        .route("/api/workflows/{name}", post(handle_workflow))
        .route("/api/health", get(handle_health));

    let api_routes = if config.monitoring.metrics_enabled {
        api_routes.route(&config.monitoring.metrics_path, get(handle_metrics))
    } else {
        api_routes
    };

    // Static dashboard when configured, JSON 404 otherwise
    let router = match &config.server.static_dir {
        Some(dir) => api_routes.fallback_service(
            ServeDir::new(dir).not_found_service(handle_not_found.into_service()),
        ),
        None => api_routes.fallback(handle_not_found),
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout,
        )))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Parse the listen address from configuration
fn parse_listen_address(listen: &str) -> Result<SocketAddr> {
    listen.parse().map_err(|e| {
        error!(
            listen_addr = %listen,
            error = %e,
            "Invalid listen address format"
        );
        crate::types::Error::Config(crate::types::ConfigError::Invalid {
            message: format!("Invalid listen address '{}': {}", listen, e),
        })
    })
}
