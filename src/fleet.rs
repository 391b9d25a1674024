//! Fleet reachability and container status
//!
//! Every registered host is probed concurrently with a trivial command. A
//! host is online when that command succeeds.

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::validators::validate_container_filter;
use crate::config::HostRegistry;
use crate::execution::{parse_records, CommandExecutor};
use crate::types::{CommandSpec, ExecutionResult, FleetReport, NodeStatus, Result};

/// Probe run on every host; the second output line is the uptime summary
pub const HEALTH_PROBE_COMMAND: &str = r#"echo "OK" && uptime"#;

/// Probe every registered host and report one entry per host
pub async fn poll_fleet(executor: &CommandExecutor, registry: &HostRegistry) -> FleetReport {
    let hosts = registry.hosts();

    let probes = hosts.iter().map(|host| {
        let spec = CommandSpec::new(host.address.clone(), HEALTH_PROBE_COMMAND);
        async move { executor.execute(&spec).await }
    });
    let results = join_all(probes).await;

    let nodes = hosts
        .iter()
        .zip(results)
        .map(|(host, result)| (host.address.clone(), node_status(&host.name, &result)))
        .collect();

    let report = FleetReport {
        success: true,
        nodes,
    };

    let online = report.online_count();
    crate::metrics::set_hosts_online(online);
    info!(online = online, total = hosts.len(), "Fleet poll finished");

    report
}

fn node_status(name: &str, result: &ExecutionResult) -> NodeStatus {
    if result.success() {
        NodeStatus {
            name: name.to_string(),
            online: true,
            uptime: uptime_line(result.output()),
            error: None,
        }
    } else {
        NodeStatus {
            name: name.to_string(),
            online: false,
            uptime: None,
            error: Some(result.error().to_string()),
        }
    }
}

/// Second line of the probe output, if present
pub fn uptime_line(output: &str) -> Option<String> {
    output
        .lines()
        .nth(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

/// `docker ps` invocation emitting one JSON record per container
pub fn docker_status_command(service: Option<&str>) -> String {
    match service {
        Some(service) => format!(
            r#"docker ps -a --filter "name={}" --format "json""#,
            service
        ),
        None => r#"docker ps -a --format "json""#.to_string(),
    }
}

/// Container listing for a host, or the failed execution as-is
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContainerStatus {
    Listed { success: bool, containers: Vec<Value> },
    Failed(ExecutionResult),
}

/// List containers on a host, optionally filtered by service name
pub async fn docker_status(
    executor: &CommandExecutor,
    host: &str,
    service: Option<&str>,
) -> Result<ContainerStatus> {
    let service = service.filter(|s| !s.is_empty());
    if let Some(service) = service {
        validate_container_filter(service, "service")?;
    }

    let spec = CommandSpec::new(host, docker_status_command(service));
    let result = executor.execute(&spec).await;

    if result.success() {
        Ok(ContainerStatus::Listed {
            success: true,
            containers: parse_records(result.output()),
        })
    } else {
        Ok(ContainerStatus::Failed(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{Reply, ScriptedRunner};
    use crate::types::{Error, HostIdentity};
    use std::sync::Arc;

    fn host(address: &str, name: &str) -> HostIdentity {
        HostIdentity {
            address: address.to_string(),
            name: name.to_string(),
            user: None,
        }
    }

    fn registry() -> Arc<HostRegistry> {
        Arc::new(HostRegistry::new(
            vec![
                host("192.168.50.10", "Lilith"),
                host("192.168.50.11", "Adam"),
                host("192.168.50.30", "Melchior"),
            ],
            Some("ops".to_string()),
        ))
    }

    const UPTIME: &str = "OK\n 10:02:11 up 12 days,  3:04,  1 user,  load average: 0.08, 0.03, 0.01\n";

    #[tokio::test]
    async fn test_poll_fleet_with_one_unreachable_host() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on_host("192.168.50.10", Reply::ok(UPTIME))
                .on_host("192.168.50.11", Reply::unreachable("192.168.50.11"))
                .on_host("192.168.50.30", Reply::ok(UPTIME)),
        );
        let registry = registry();
        let executor = CommandExecutor::new(runner.clone(), registry.clone());

        let report = poll_fleet(&executor, &registry).await;

        assert!(report.success);
        assert_eq!(report.nodes.len(), 3);
        assert_eq!(report.online_count(), 2);

        let adam = &report.nodes["192.168.50.11"];
        assert_eq!(adam.name, "Adam");
        assert!(!adam.online);
        assert!(adam.uptime.is_none());
        assert!(adam.error.as_deref().unwrap().contains("Connection refused"));

        let lilith = &report.nodes["192.168.50.10"];
        assert!(lilith.online);
        assert!(lilith.error.is_none());
        assert!(lilith.uptime.as_deref().unwrap().starts_with("10:02:11 up 12 days"));

        assert!(runner
            .commands()
            .iter()
            .all(|c| c == HEALTH_PROBE_COMMAND));
    }

    #[tokio::test]
    async fn test_poll_fleet_offline_on_nonzero_exit() {
        let runner = Arc::new(ScriptedRunner::new().on_host("192.168.50.30", Reply::exit(127, "")));
        let registry = registry();
        let executor = CommandExecutor::new(runner, registry.clone());

        let report = poll_fleet(&executor, &registry).await;

        let melchior = &report.nodes["192.168.50.30"];
        assert!(!melchior.online);
        assert_eq!(melchior.error.as_deref(), Some("Command exited with code 127"));
    }

    #[tokio::test]
    async fn test_poll_empty_fleet() {
        let registry = Arc::new(HostRegistry::new(Vec::new(), None));
        let executor = CommandExecutor::new(Arc::new(ScriptedRunner::new()), registry.clone());

        let report = poll_fleet(&executor, &registry).await;
        assert!(report.nodes.is_empty());
    }

    #[test]
    fn test_uptime_line() {
        assert_eq!(
            uptime_line("OK\nup 3 days").as_deref(),
            Some("up 3 days")
        );
        assert_eq!(uptime_line("OK"), None);
        assert_eq!(uptime_line(""), None);
    }

    #[test]
    fn test_offline_node_serialization_omits_uptime() {
        let status = node_status(
            "Adam",
            &ExecutionResult::failure(crate::types::FailureKind::Connection, "timed out"),
        );
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["online"], false);
        assert_eq!(json["error"], "timed out");
        assert!(json.get("uptime").is_none());
    }

    #[test]
    fn test_docker_status_command() {
        assert_eq!(
            docker_status_command(Some("neo4j-memory")),
            r#"docker ps -a --filter "name=neo4j-memory" --format "json""#
        );
        assert_eq!(docker_status_command(None), r#"docker ps -a --format "json""#);
    }

    #[tokio::test]
    async fn test_docker_status_parses_containers() {
        let listing = "{\"Names\":\"neo4j\",\"State\":\"running\"}\ngarbage\n{\"Names\":\"qdrant\",\"State\":\"exited\"}\n";
        let runner = Arc::new(ScriptedRunner::new().on_host("192.168.50.10", Reply::ok(listing)));
        let executor = CommandExecutor::new(runner.clone(), registry());

        let status = docker_status(&executor, "192.168.50.10", None).await.unwrap();

        match status {
            ContainerStatus::Listed {
                success,
                containers,
            } => {
                assert!(success);
                assert_eq!(containers.len(), 2);
                assert_eq!(containers[1]["Names"], "qdrant");
            }
            other => panic!("Expected container listing, got: {:?}", other),
        }
        assert_eq!(runner.commands(), vec![docker_status_command(None)]);
    }

    #[tokio::test]
    async fn test_docker_status_passes_failure_through() {
        let runner = Arc::new(
            ScriptedRunner::new().on_host("192.168.50.10", Reply::exit(1, "docker: command not found")),
        );
        let executor = CommandExecutor::new(runner, registry());

        let status = docker_status(&executor, "192.168.50.10", Some("neo4j")).await.unwrap();

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], 1);
        assert_eq!(json["error"], "docker: command not found");
        assert!(json.get("containers").is_none());
    }

    #[tokio::test]
    async fn test_docker_status_rejects_unsafe_service_name() {
        let runner = Arc::new(ScriptedRunner::new());
        let executor = CommandExecutor::new(runner.clone(), registry());

        let result = docker_status(&executor, "192.168.50.10", Some("x\"; reboot")).await;

        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_docker_status_empty_listing_is_success() {
        let executor = CommandExecutor::new(Arc::new(ScriptedRunner::new()), registry());

        let status = docker_status(&executor, "192.168.50.10", Some("")).await.unwrap();
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["containers"], serde_json::json!([]));
    }
}
