use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Application error: {0}")]
    Application(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config file parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Failures raised while establishing or driving a single remote session.
///
/// These never escape the command executor; they are folded into
/// [`ExecutionResult::Failed`] with the matching [`FailureKind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Failed to read SSH key {path}: {message}")]
    Credential { path: String, message: String },

    #[error("Connection to {address} failed: {message}")]
    Connection { address: String, message: String },

    #[error("Connection to {address} not ready after {timeout_secs}s")]
    ReadinessTimeout { address: String, timeout_secs: u64 },

    #[error("Authentication rejected for {user}@{address}")]
    AuthRejected { user: String, address: String },

    #[error("Remote command could not be run: {message}")]
    Exec { message: String },
}

impl SessionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SessionError::Credential { .. } => FailureKind::Credential,
            SessionError::Connection { .. }
            | SessionError::ReadinessTimeout { .. }
            | SessionError::AuthRejected { .. } => FailureKind::Connection,
            SessionError::Exec { .. } => FailureKind::Exec,
        }
    }
}

/// Type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

/// A known host in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIdentity {
    pub address: String,
    pub name: String,
    /// Default login user; falls back to `ssh.default_user` when absent
    #[serde(default)]
    pub user: Option<String>,
}

/// One unit of remote work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub host: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl CommandSpec {
    pub fn new(host: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            command: command.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Why an execution produced no exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Private key unreadable or undecodable
    Credential,
    /// Network unreachable, authentication rejected, readiness timeout or dropped connection
    Connection,
    /// The remote side refused or abandoned the command before an exit status
    Exec,
    /// No login user could be resolved for the host
    Configuration,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Credential => "credential",
            FailureKind::Connection => "connection",
            FailureKind::Exec => "exec",
            FailureKind::Configuration => "configuration",
        }
    }
}

/// Canonical outcome of one command execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "ExecutionResultBody")]
pub enum ExecutionResult {
    /// The remote process ran and reported an exit status
    Completed {
        exit_code: u32,
        output: String,
        error: String,
    },
    /// No exit status was observed
    Failed { kind: FailureKind, error: String },
}

impl ExecutionResult {
    /// Build a result from a finished remote process.
    ///
    /// Both streams are trimmed. A non-zero exit with an empty error stream
    /// gets a synthesized message naming the exit code.
    pub fn from_exit(exit_code: u32, stdout: &str, stderr: &str) -> Self {
        let error = stderr.trim();
        let error = if exit_code != 0 && error.is_empty() {
            format!("Command exited with code {}", exit_code)
        } else {
            error.to_string()
        };

        ExecutionResult::Completed {
            exit_code,
            output: stdout.trim().to_string(),
            error,
        }
    }

    pub fn failure(kind: FailureKind, error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            format!("Execution failed ({})", kind.as_str())
        } else {
            error
        };
        ExecutionResult::Failed { kind, error }
    }

    pub fn success(&self) -> bool {
        matches!(self, ExecutionResult::Completed { exit_code: 0, .. })
    }

    pub fn exit_code(&self) -> Option<u32> {
        match self {
            ExecutionResult::Completed { exit_code, .. } => Some(*exit_code),
            ExecutionResult::Failed { .. } => None,
        }
    }

    pub fn output(&self) -> &str {
        match self {
            ExecutionResult::Completed { output, .. } => output,
            ExecutionResult::Failed { .. } => "",
        }
    }

    pub fn error(&self) -> &str {
        match self {
            ExecutionResult::Completed { error, .. } | ExecutionResult::Failed { error, .. } => {
                error
            }
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionResult::Completed { .. } => None,
            ExecutionResult::Failed { kind, .. } => Some(*kind),
        }
    }

    /// Metric label for the outcome
    pub fn outcome_label(&self) -> &'static str {
        match self {
            ExecutionResult::Completed { exit_code: 0, .. } => "success",
            ExecutionResult::Completed { .. } => "nonzero_exit",
            ExecutionResult::Failed { kind, .. } => kind.as_str(),
        }
    }
}

impl From<SessionError> for ExecutionResult {
    fn from(err: SessionError) -> Self {
        ExecutionResult::failure(err.kind(), err.to_string())
    }
}

/// Wire shape of [`ExecutionResult`]
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResultBody {
    pub success: bool,
    pub output: String,
    pub error: String,
    pub code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl From<ExecutionResult> for ExecutionResultBody {
    fn from(result: ExecutionResult) -> Self {
        let success = result.success();
        match result {
            ExecutionResult::Completed {
                exit_code,
                output,
                error,
            } => Self {
                success,
                output,
                error,
                code: Some(exit_code),
                kind: None,
            },
            ExecutionResult::Failed { kind, error } => Self {
                success,
                output: String::new(),
                error,
                code: None,
                kind: Some(kind),
            },
        }
    }
}

/// A requested step paired with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    #[serde(flatten)]
    pub spec: CommandSpec,
    pub result: ExecutionResult,
}

impl StepResult {
    pub fn new(spec: CommandSpec, result: ExecutionResult) -> Self {
        Self { spec, result }
    }
}

/// Outcome of a fail-fast workflow.
///
/// A workflow that stopped early carries fewer steps than were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowReport {
    pub success: bool,
    pub steps: Vec<StepResult>,
}

impl WorkflowReport {
    pub fn from_steps(steps: Vec<StepResult>) -> Self {
        let success = steps.iter().all(|step| step.result.success());
        Self { success, steps }
    }
}

/// Outcome of a collect-all batch: one entry per requested step, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// The batch itself was processed; per-step outcomes live in `results`
    pub success: bool,
    pub results: Vec<StepResult>,
}

impl BatchReport {
    pub fn from_results(results: Vec<StepResult>) -> Self {
        Self {
            success: true,
            results,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.result.success()).count()
    }
}

/// Reachability of one registered host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub name: String,
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fleet-wide status keyed by host address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetReport {
    pub success: bool,
    pub nodes: BTreeMap<String, NodeStatus>,
}

impl FleetReport {
    pub fn online_count(&self) -> usize {
        self.nodes.values().filter(|n| n.online).count()
    }
}
