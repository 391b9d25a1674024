//! Prometheus metrics for remote command execution
//!
//! This module provides a global metrics registry and helper functions
//! to track SSH command outcomes, orchestrations and fleet reachability.

use lazy_static::lazy_static;
use prometheus::{
    opts, register_histogram, register_int_counter_vec, register_int_gauge, Encoder, Histogram,
    IntCounterVec, IntGauge, Registry, TextEncoder,
};
use std::sync::Once;
use tracing::{debug, warn};

use crate::types::ExecutionResult;

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref REGISTRY: Registry = Registry::new();

    /// Total number of SSH command executions by outcome
    /// Labels: outcome (success, nonzero_exit, credential, connection, exec, configuration)
    pub static ref SSH_COMMANDS_TOTAL: IntCounterVec = register_int_counter_vec!(
        opts!("ssh_commands_total", "Total number of remote command executions"),
        &["outcome"]
    )
    .expect("Failed to create ssh_commands_total metric");

    /// Wall time of one execution including connect and authentication
    /// Buckets span a fast probe (50ms) to a long migration step (30min)
    pub static ref SSH_COMMAND_DURATION_SECONDS: Histogram = register_histogram!(
        "ssh_command_duration_seconds",
        "Remote command execution times",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0, 1800.0]
    )
    .expect("Failed to create ssh_command_duration_seconds metric");

    /// Total number of orchestrations by mode and status
    /// Labels: mode (batch, workflow), status (succeeded, failed)
    pub static ref ORCHESTRATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        opts!("orchestrations_total", "Total number of batches and workflows"),
        &["mode", "status"]
    )
    .expect("Failed to create orchestrations_total metric");

    /// Hosts that answered the last fleet poll
    pub static ref FLEET_HOSTS_ONLINE: IntGauge = register_int_gauge!(
        opts!("fleet_hosts_online", "Registered hosts online at the last fleet poll")
    )
    .expect("Failed to create fleet_hosts_online metric");
}

static INIT: Once = Once::new();

/// Register all metrics with the global registry. Safe to call more than once.
pub fn init_metrics() {
    INIT.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(SSH_COMMANDS_TOTAL.clone()),
            Box::new(SSH_COMMAND_DURATION_SECONDS.clone()),
            Box::new(ORCHESTRATIONS_TOTAL.clone()),
            Box::new(FLEET_HOSTS_ONLINE.clone()),
        ];

        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                warn!(error = %e, "Failed to register metric");
            }
        }

        debug!("Prometheus metrics registry initialized");
    });
}

/// Record one finished execution
pub fn record_command(result: &ExecutionResult, duration_ms: u64) {
    let outcome = result.outcome_label();
    SSH_COMMANDS_TOTAL.with_label_values(&[outcome]).inc();

    let duration_seconds = duration_ms as f64 / 1000.0;
    SSH_COMMAND_DURATION_SECONDS.observe(duration_seconds);

    debug!(
        outcome = %outcome,
        duration_ms = duration_ms,
        "Recorded command execution metric"
    );
}

/// Record a finished batch or workflow
pub fn record_orchestration(mode: &str, success: bool) {
    let status = if success { "succeeded" } else { "failed" };
    ORCHESTRATIONS_TOTAL.with_label_values(&[mode, status]).inc();

    debug!(mode = %mode, status = %status, "Recorded orchestration metric");
}

/// Set the number of hosts seen online by the latest poll
pub fn set_hosts_online(count: usize) {
    FLEET_HOSTS_ONLINE.set(count as i64);
}

/// Gather all metrics and encode them in Prometheus text format
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Failed to convert metrics to UTF-8: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;

    #[test]
    fn test_record_command_by_outcome() {
        let before = SSH_COMMANDS_TOTAL.with_label_values(&["connection"]).get();

        record_command(
            &ExecutionResult::failure(FailureKind::Connection, "refused"),
            120,
        );
        record_command(&ExecutionResult::from_exit(0, "ok", ""), 40);

        let after = SSH_COMMANDS_TOTAL.with_label_values(&["connection"]).get();
        assert!(after > before);
    }

    #[test]
    fn test_record_orchestration() {
        let before = ORCHESTRATIONS_TOTAL
            .with_label_values(&["workflow", "failed"])
            .get();
        record_orchestration("workflow", false);
        let after = ORCHESTRATIONS_TOTAL
            .with_label_values(&["workflow", "failed"])
            .get();
        assert!(after > before);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics();

        record_command(&ExecutionResult::from_exit(1, "", "boom"), 10);
        set_hosts_online(2);

        let metrics_text = gather_metrics().unwrap();
        assert!(metrics_text.contains("ssh_commands_total"));
        assert!(metrics_text.contains("fleet_hosts_online"));
        assert!(metrics_text.contains("# HELP"));
        assert!(metrics_text.contains("# TYPE"));
    }
}
