//! HTTP endpoint handlers for the gateway API
//!
//! Handlers validate the request body, hand the work to the executor,
//! orchestrator or fleet poller, and shape the JSON reply.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::{sync::Arc, time::SystemTime};
use tracing::{info, warn};

use crate::{
    config::SystemConfig,
    deployment::DeploymentManager,
    execution::CommandExecutor,
    fleet::{self, ContainerStatus},
    http::responses::*,
    orchestration,
    types::{Error, Result},
};

/// Workflow served by POST /api/migrate/memory
pub const MEMORY_WORKFLOW: &str = "memory";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub system_config: SystemConfig,
    pub executor: CommandExecutor,
    pub deployment_manager: Arc<DeploymentManager>,
    pub start_time: SystemTime,
}

impl AppState {
    pub fn new(system_config: SystemConfig, executor: CommandExecutor) -> Self {
        let deployment_manager = Arc::new(DeploymentManager::from_config(
            executor.clone(),
            &system_config,
        ));

        Self {
            system_config,
            executor,
            deployment_manager,
            start_time: SystemTime::now(),
        }
    }
}

/// POST /api/ssh - Run one command on one host
pub async fn handle_ssh(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SshRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(invalid_body)?;
    let spec = request.into_spec("body")?;

    info!(host = %spec.host, "Received command request");

    let result = state.executor.execute(&spec).await;
    Ok(execution_response(result))
}

/// POST /api/ssh/batch - Run every command and report each outcome
pub async fn handle_batch(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(invalid_body)?;

    let commands = request.commands.ok_or_else(|| Error::Validation {
        field: "commands".to_string(),
        message: "Commands array is required".to_string(),
    })?;

    let steps: Vec<_> = commands
        .into_iter()
        .map(SshRequest::into_batch_spec)
        .collect();

    info!(steps = steps.len(), "Received batch request");

    let report = orchestration::run_batch(&state.executor, steps).await;
    Ok(Json(report).into_response())
}

/// GET /api/nodes/status - Probe every registered host
pub async fn handle_nodes_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = fleet::poll_fleet(&state.executor, state.executor.registry()).await;
    Json(report)
}

/// POST /api/docker/status - List containers on a host
pub async fn handle_docker_status(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<DockerStatusRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(invalid_body)?;

    let host = non_empty(request.host).ok_or_else(|| Error::Validation {
        field: "host".to_string(),
        message: "Host is required".to_string(),
    })?;

    let status = fleet::docker_status(&state.executor, &host, request.service.as_deref()).await?;

    Ok(match status {
        ContainerStatus::Failed(result) => execution_response(result),
        listed => Json(listed).into_response(),
    })
}

/// POST /api/deploy - Run a configured deployment profile on a host
pub async fn handle_deploy(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<DeployRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(invalid_body)?;

    let (host, kind) = match (non_empty(request.host), non_empty(request.kind)) {
        (Some(host), Some(kind)) => (host, kind),
        _ => {
            return Err(Error::Validation {
                field: "body".to_string(),
                message: "Host and type are required".to_string(),
            })
        }
    };

    let result = state.deployment_manager.deploy(&host, &kind).await?;
    Ok(execution_response(result))
}

/// POST /api/migrate/memory - Run the memory migration workflow
pub async fn handle_migrate_memory(State(state): State<Arc<AppState>>) -> Result<Response> {
    let report = state
        .deployment_manager
        .run_named_workflow(MEMORY_WORKFLOW)
        .await?;
    Ok(Json(report).into_response())
}

/// POST /api/workflows/{name} - Run any configured workflow
pub async fn handle_workflow(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response> {
    let report = state.deployment_manager.run_named_workflow(&name).await?;
    Ok(Json(report).into_response())
}

/// GET /api/health - Liveness of the gateway itself
pub async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime_seconds = state
        .start_time
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        success: true,
        service: "sshgate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
    })
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn handle_metrics() -> std::result::Result<impl IntoResponse, StatusCode> {
    match crate::metrics::gather_metrics() {
        Ok(metrics_text) => Ok((
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            metrics_text,
        )),
        Err(e) => {
            warn!(error = %e, "Failed to gather Prometheus metrics");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Fallback handler for 404 Not Found
pub async fn handle_not_found() -> impl IntoResponse {
    Error::NotFound("Endpoint not found".to_string())
}
