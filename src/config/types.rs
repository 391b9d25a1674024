use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::{CommandSpec, ConfigError, HostIdentity, Result};

/// System configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Static host registry keyed by address
    #[serde(default)]
    pub hosts: Vec<HostIdentity>,
    #[serde(default)]
    pub deploy: DeployConfig,
    /// Named fail-fast workflows
    #[serde(default)]
    pub workflows: BTreeMap<String, WorkflowConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Directory served as a static site for unmatched routes
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    #[serde(default = "default_key_path")]
    pub key_path: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Seconds allowed for connect plus authentication
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout: u64,
    /// Seconds between keepalive probes while a command runs
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
    /// Unanswered keepalives before the connection is declared dead
    #[serde(default = "default_keepalive_max")]
    pub keepalive_max: usize,
    /// Login user for hosts that neither the request nor the registry name one for
    #[serde(default)]
    pub default_user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Cap on captured bytes per stream
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

/// Deployment type name to the single command it runs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeployConfig {
    #[serde(default)]
    pub profiles: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<CommandSpec>,
}

impl SystemConfig {
    /// Load system configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::FileNotFound { path: path_str })?;

        let config: SystemConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            request_timeout: default_request_timeout(),
            static_dir: None,
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            key_path: default_key_path(),
            port: default_ssh_port(),
            ready_timeout: default_ready_timeout(),
            keepalive_interval: default_keepalive_interval(),
            keepalive_max: default_keepalive_max(),
            default_user: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
            metrics_path: default_metrics_path(),
        }
    }
}

// Default value functions
fn default_listen() -> String {
    "127.0.0.1:3333".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_key_path() -> String {
    match std::env::var("HOME") {
        Ok(home) => format!("{}/.ssh/id_rsa", home.trim_end_matches('/')),
        Err(_) => "/root/.ssh/id_rsa".to_string(),
    }
}

fn default_ssh_port() -> u16 {
    22
}

fn default_ready_timeout() -> u64 {
    10
}

fn default_keepalive_interval() -> u64 {
    5
}

fn default_keepalive_max() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_output_bytes() -> usize {
    crate::execution::DEFAULT_MAX_OUTPUT_BYTES
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
