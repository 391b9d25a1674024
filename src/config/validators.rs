use std::collections::HashSet;
use std::net::SocketAddr;

use super::types::{SystemConfig, WorkflowConfig};
use crate::types::{CommandSpec, HostIdentity, Result};

// Validation helper functions

/// Validate listen address format (host:port)
pub(crate) fn validate_listen_address(addr: &str) -> Result<()> {
    addr.parse::<SocketAddr>()
        .map_err(|_| crate::types::Error::Validation {
            field: "server.listen".to_string(),
            message: format!("Invalid listen address format '{}'. Expected format: 'host:port' (e.g., '127.0.0.1:3333')", addr),
        })?;
    Ok(())
}

/// Validate positive timeout value
pub(crate) fn validate_positive_timeout(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: "Timeout must be greater than 0".to_string(),
        });
    }
    Ok(())
}

/// Validate that a value lies within an inclusive range
pub(crate) fn validate_range(value: u64, field: &str, min: u64, max: u64) -> Result<()> {
    if value < min {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: format!("Value {} is below minimum allowed value {}", value, min),
        });
    }
    if value > max {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: format!("Value {} exceeds maximum allowed value {}", value, max),
        });
    }
    Ok(())
}

fn validate_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: "Value cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Validate the host registry: non-empty fields and unique addresses
pub(crate) fn validate_hosts(hosts: &[HostIdentity]) -> Result<()> {
    let mut seen = HashSet::new();

    for (i, host) in hosts.iter().enumerate() {
        validate_non_empty(&host.address, &format!("hosts[{}].address", i))?;
        validate_non_empty(&host.name, &format!("hosts[{}].name", i))?;

        if !seen.insert(host.address.as_str()) {
            return Err(crate::types::Error::Validation {
                field: format!("hosts[{}].address", i),
                message: format!("Duplicate host address '{}'", host.address),
            });
        }
    }

    Ok(())
}

/// Every step must name a host and a command
pub(crate) fn validate_command_spec(spec: &CommandSpec, field: &str) -> Result<()> {
    validate_non_empty(&spec.host, &format!("{}.host", field))?;
    validate_non_empty(&spec.command, &format!("{}.command", field))?;
    Ok(())
}

/// Validate a named workflow definition
pub(crate) fn validate_workflow(name: &str, workflow: &WorkflowConfig) -> Result<()> {
    let field = format!("workflows.{}", name);

    if workflow.steps.is_empty() {
        return Err(crate::types::Error::Validation {
            field: format!("{}.steps", field),
            message: "Workflow must define at least one step".to_string(),
        });
    }

    for (i, step) in workflow.steps.iter().enumerate() {
        validate_command_spec(step, &format!("{}.steps[{}]", field, i))?;
    }

    Ok(())
}

/// Service names interpolated into `docker ps --filter` must be plain identifiers
pub(crate) fn validate_container_filter(name: &str, field: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if !valid {
        return Err(crate::types::Error::Validation {
            field: field.to_string(),
            message: format!(
                "Invalid service name '{}'. Only letters, digits, '-', '_' and '.' are allowed",
                name
            ),
        });
    }
    Ok(())
}

impl SystemConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate server configuration
        validate_listen_address(&self.server.listen)?;
        validate_positive_timeout(self.server.request_timeout, "server.request_timeout")?;

        // Validate SSH session settings
        validate_non_empty(&self.ssh.key_path, "ssh.key_path")?;
        validate_range(self.ssh.port as u64, "ssh.port", 1, 65535)?;
        validate_positive_timeout(self.ssh.ready_timeout, "ssh.ready_timeout")?;
        validate_positive_timeout(self.ssh.keepalive_interval, "ssh.keepalive_interval")?;
        validate_range(self.ssh.keepalive_max as u64, "ssh.keepalive_max", 1, 100)?;

        // Validate logging configuration
        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(crate::types::Error::Validation {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ),
            });
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(crate::types::Error::Validation {
                field: "logging.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Must be one of: json, pretty",
                    self.logging.format
                ),
            });
        }

        validate_range(
            self.limits.max_output_bytes as u64,
            "limits.max_output_bytes",
            1024,
            64 * 1024 * 1024,
        )?;

        if !self.monitoring.metrics_path.starts_with('/') {
            return Err(crate::types::Error::Validation {
                field: "monitoring.metrics_path".to_string(),
                message: format!(
                    "Metrics path '{}' must start with '/'",
                    self.monitoring.metrics_path
                ),
            });
        }

        validate_hosts(&self.hosts)?;

        for (name, command) in &self.deploy.profiles {
            validate_non_empty(command, &format!("deploy.profiles.{}", name))?;
        }

        for (name, workflow) in &self.workflows {
            validate_workflow(name, workflow)?;
        }

        Ok(())
    }
}
