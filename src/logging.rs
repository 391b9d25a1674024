//! Logging setup for the SSH gateway
//!
//! This module provides structured logging functionality with support for:
//! - JSON and pretty format output
//! - Configurable log levels via environment or configuration
//! - Host and workflow context spans
//!
//! Use context helpers for structured logging:
//! ```rust,ignore
//! let _span = logging::host_span("192.168.50.10").entered();
//! ```

use tracing::{info_span, Span};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

use crate::config::SystemConfig;
use crate::types::Result;

/// Span wrapping everything done against one remote host
pub fn host_span(address: &str) -> Span {
    info_span!("host", host = address)
}

/// Span wrapping one named or ad-hoc orchestration
pub fn workflow_span(name: &str) -> Span {
    info_span!("workflow", workflow = name)
}

/// Log level enum values as strings for configuration
pub mod level {
    pub const TRACE: &str = "trace";
    pub const DEBUG: &str = "debug";
    pub const INFO: &str = "info";
    pub const WARN: &str = "warn";
    pub const ERROR: &str = "error";
}

/// Log format enum values as strings for configuration
pub mod format {
    pub const JSON: &str = "json";
    pub const PRETTY: &str = "pretty";
}

/// Initialize logging with configuration
///
/// # Precedence
///
/// 1. CLI arguments (highest priority)
/// 2. `RUST_LOG`
/// 3. System configuration file
/// 4. Default values (lowest priority)
pub fn init(
    log_level_override: Option<&str>,
    log_format_override: Option<&str>,
    system_config: Option<&SystemConfig>,
) -> Result<()> {
    let log_format = if let Some(fmt) = log_format_override {
        fmt
    } else if let Some(config) = system_config {
        &config.logging.format
    } else {
        format::PRETTY
    };

    let env_filter = match log_level_override {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                system_config
                    .map(|c| c.logging.level.as_str())
                    .unwrap_or(level::INFO),
            )
        }),
    };

    let timer = ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string());

    let installed = match log_format {
        format::JSON => tracing_subscriber::fmt()
            .json()
            .with_timer(timer)
            .with_env_filter(env_filter)
            .with_target(false)
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
        format::PRETTY => tracing_subscriber::fmt()
            .pretty()
            .with_timer(timer)
            .with_env_filter(env_filter)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_timer(timer)
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init(),
    };

    installed.map_err(|e| {
        crate::types::Error::Application(format!("Failed to initialize logging: {}", e))
    })
}
