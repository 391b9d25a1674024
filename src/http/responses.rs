//! HTTP request and response types for the gateway API

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::types::{CommandSpec, Error, ExecutionResult, Result};

/// POST /api/ssh and one entry of a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshRequest {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

impl SshRequest {
    /// Turn the request into a step, rejecting a missing host or command
    pub fn into_spec(self, field: &str) -> Result<CommandSpec> {
        let (host, command) = match (non_empty(self.host), non_empty(self.command)) {
            (Some(host), Some(command)) => (host, command),
            _ => {
                return Err(Error::Validation {
                    field: field.to_string(),
                    message: "Host and command are required".to_string(),
                })
            }
        };

        Ok(CommandSpec {
            host,
            command,
            user: non_empty(self.user),
        })
    }

    /// Turn a batch entry into a step without rejecting it.
    ///
    /// A missing host or command is left blank; the executor reports such a
    /// step as a configuration failure instead of running it.
    pub fn into_batch_spec(self) -> CommandSpec {
        CommandSpec {
            host: non_empty(self.host).unwrap_or_default(),
            command: non_empty(self.command).unwrap_or_default(),
            user: non_empty(self.user),
        }
    }
}

/// POST /api/ssh/batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub commands: Option<Vec<SshRequest>>,
}

/// POST /api/docker/status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerStatusRequest {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

/// POST /api/deploy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployRequest {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: &Error) -> Self {
        Self {
            success: false,
            error: error_message(error),
            code: error_to_code(error),
        }
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Map a body that failed to parse to a validation error
pub fn invalid_body(rejection: JsonRejection) -> Error {
    Error::Validation {
        field: "body".to_string(),
        message: rejection.body_text(),
    }
}

/// Single execution results: 500 when no exit status was observed
pub fn execution_response(result: ExecutionResult) -> Response {
    let status = match result {
        ExecutionResult::Completed { .. } => StatusCode::OK,
        ExecutionResult::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(result)).into_response()
}

// Validation and lookup messages are shown to callers as-is
fn error_message(error: &Error) -> String {
    match error {
        Error::Validation { message, .. } => message.clone(),
        Error::NotFound(message) => message.clone(),
        other => other.to_string(),
    }
}

fn error_to_code(error: &Error) -> String {
    match error {
        Error::Config(_) => "CONFIG_ERROR".to_string(),
        Error::Validation { .. } => "VALIDATION_ERROR".to_string(),
        Error::NotFound(_) => "NOT_FOUND".to_string(),
        Error::Io(_) => "IO_ERROR".to_string(),
        Error::Application(_) => "APPLICATION_ERROR".to_string(),
    }
}

/// Convert error types to HTTP status codes
pub fn error_to_status_code(error: &Error) -> StatusCode {
    match error {
        Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Application(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Implement IntoResponse for Error types to automatically convert them to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = error_to_status_code(&self);
        let error_response = ErrorResponse::new(&self);
        (status_code, Json(error_response)).into_response()
    }
}
