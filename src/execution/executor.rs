use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

use crate::config::HostRegistry;
use crate::logging::host_span;
use crate::session::{RemoteRunner, SessionTarget};
use crate::types::{CommandSpec, ExecutionResult, FailureKind};

/// Default cap for captured stdout/stderr, per stream
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Runs one command on one host and folds every outcome into an [`ExecutionResult`].
///
/// The executor never retries and never returns an error: transport and
/// credential failures become [`ExecutionResult::Failed`].
#[derive(Clone)]
pub struct CommandExecutor {
    runner: Arc<dyn RemoteRunner>,
    registry: Arc<HostRegistry>,
    max_output_bytes: usize,
}

impl CommandExecutor {
    pub fn new(runner: Arc<dyn RemoteRunner>, registry: Arc<HostRegistry>) -> Self {
        Self {
            runner,
            registry,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// Execute a single command on its host
    pub async fn execute(&self, spec: &CommandSpec) -> ExecutionResult {
        let span = host_span(&spec.host);
        self.execute_inner(spec).instrument(span).await
    }

    async fn execute_inner(&self, spec: &CommandSpec) -> ExecutionResult {
        let start_time = Instant::now();

        let user = if spec.host.trim().is_empty() || spec.command.trim().is_empty() {
            Err(ExecutionResult::failure(
                FailureKind::Configuration,
                "Host and command are required",
            ))
        } else {
            self.registry.resolve_user(spec).ok_or_else(|| {
                ExecutionResult::failure(
                    FailureKind::Configuration,
                    format!("No SSH user configured for host {}", spec.host),
                )
            })
        };

        let result = match user {
            Ok(user) => {
                let target = SessionTarget {
                    address: spec.host.clone(),
                    user,
                };

                debug!(
                    user = %target.user,
                    command = %spec.command,
                    "Executing remote command"
                );

                match self.runner.run(&target, &spec.command).await {
                    Ok(output) => {
                        let stdout = truncate_output(&output.stdout, self.max_output_bytes);
                        let stderr = truncate_output(&output.stderr, self.max_output_bytes);
                        ExecutionResult::from_exit(output.exit_status, &stdout, &stderr)
                    }
                    Err(e) => e.into(),
                }
            }
            Err(rejected) => rejected,
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        crate::metrics::record_command(&result, duration_ms);

        match &result {
            ExecutionResult::Completed { exit_code: 0, .. } => {
                info!(duration_ms = duration_ms, "Remote command succeeded");
            }
            ExecutionResult::Completed {
                exit_code, error, ..
            } => {
                warn!(
                    exit_code = exit_code,
                    stderr = %error,
                    duration_ms = duration_ms,
                    "Remote command failed with non-zero exit code"
                );
            }
            ExecutionResult::Failed { kind, error } => {
                warn!(
                    kind = kind.as_str(),
                    error = %error,
                    duration_ms = duration_ms,
                    "Remote command could not be executed"
                );
            }
        }

        result
    }
}

/// Truncate captured output to a byte limit, cutting on a character boundary
fn truncate_output(output: &[u8], max_bytes: usize) -> String {
    let output_str = String::from_utf8_lossy(output);
    if output_str.len() > max_bytes {
        let mut end = max_bytes;
        while !output_str.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated at {} bytes]", &output_str[..end], max_bytes)
    } else {
        output_str.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{Reply, ScriptedRunner};
    use crate::types::{HostIdentity, SessionError};

    fn registry(default_user: Option<&str>) -> Arc<HostRegistry> {
        Arc::new(HostRegistry::new(
            vec![HostIdentity {
                address: "10.0.0.1".to_string(),
                name: "alpha".to_string(),
                user: Some("alpha-ops".to_string()),
            }],
            default_user.map(str::to_string),
        ))
    }

    fn executor(runner: Arc<ScriptedRunner>) -> CommandExecutor {
        CommandExecutor::new(runner, registry(Some("deploy")))
    }

    #[tokio::test]
    async fn test_successful_command_execution() {
        let runner = Arc::new(
            ScriptedRunner::new().on_command("10.0.0.1", "uptime", Reply::ok("  up 3 days\n")),
        );
        let executor = executor(runner.clone());

        let result = executor.execute(&CommandSpec::new("10.0.0.1", "uptime")).await;

        assert!(result.success());
        assert_eq!(result.exit_code(), Some(0));
        assert_eq!(result.output(), "up 3 days");
        assert_eq!(result.error(), "");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user, "alpha-ops");
        assert_eq!(calls[0].command, "uptime");
    }

    #[tokio::test]
    async fn test_command_with_non_zero_exit() {
        let runner =
            Arc::new(ScriptedRunner::new().on_command("10.0.0.1", "false", Reply::exit(1, "")));
        let executor = executor(runner);

        let result = executor.execute(&CommandSpec::new("10.0.0.1", "false")).await;

        assert!(!result.success());
        assert_eq!(result.exit_code(), Some(1));
        assert_eq!(result.error(), "Command exited with code 1");
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_failed_result() {
        let runner = Arc::new(ScriptedRunner::new().on_host("10.0.0.9", Reply::unreachable("10.0.0.9")));
        let executor = executor(runner);

        let result = executor.execute(&CommandSpec::new("10.0.0.9", "uptime")).await;

        assert!(!result.success());
        assert_eq!(result.exit_code(), None);
        assert_eq!(result.failure_kind(), Some(FailureKind::Connection));
        assert!(result.error().contains("Connection refused"));
    }

    #[tokio::test]
    async fn test_credential_failure_kind() {
        let runner = Arc::new(ScriptedRunner::new().on_host(
            "10.0.0.1",
            Reply::Error(SessionError::Credential {
                path: "/root/.ssh/id_rsa".to_string(),
                message: "No such file or directory".to_string(),
            }),
        ));
        let executor = executor(runner);

        let result = executor.execute(&CommandSpec::new("10.0.0.1", "uptime")).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Credential));
        assert!(result.error().contains("/root/.ssh/id_rsa"));
    }

    #[tokio::test]
    async fn test_unresolvable_user_never_reaches_runner() {
        let runner = Arc::new(ScriptedRunner::new());
        let executor = CommandExecutor::new(runner.clone(), registry(None));

        let result = executor.execute(&CommandSpec::new("10.0.0.2", "uptime")).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::Configuration));
        assert!(result.error().contains("10.0.0.2"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_host_or_command_never_reaches_runner() {
        let runner = Arc::new(ScriptedRunner::new());
        let executor = executor(runner.clone());

        for spec in [
            CommandSpec::new("", "uptime"),
            CommandSpec::new("10.0.0.1", "   "),
        ] {
            let result = executor.execute(&spec).await;
            assert_eq!(result.failure_kind(), Some(FailureKind::Configuration));
            assert_eq!(result.error(), "Host and command are required");
        }
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_request_user_overrides_registry() {
        let runner = Arc::new(ScriptedRunner::new());
        let executor = executor(runner.clone());

        executor
            .execute(&CommandSpec::new("10.0.0.1", "whoami").with_user("root"))
            .await;

        assert_eq!(runner.calls()[0].user, "root");
    }

    #[tokio::test]
    async fn test_repeated_probe_is_idempotent() {
        let runner = Arc::new(ScriptedRunner::new().on_host("10.0.0.1", Reply::exit(3, "nope")));
        let executor = executor(runner);
        let spec = CommandSpec::new("10.0.0.1", "check");

        let first = executor.execute(&spec).await;
        let second = executor.execute(&spec).await;

        assert_eq!(first.success(), second.success());
        assert_eq!(first.exit_code(), second.exit_code());
    }

    #[tokio::test]
    async fn test_large_output_is_truncated() {
        let big = "x".repeat(4096);
        let runner = Arc::new(ScriptedRunner::new().on_host("10.0.0.1", Reply::ok(&big)));
        let executor = executor(runner).with_max_output_bytes(1024);

        let result = executor.execute(&CommandSpec::new("10.0.0.1", "cat big")).await;

        assert!(result.success());
        assert!(result.output().contains("truncated at 1024 bytes"));
        assert!(result.output().len() < 4096);
    }

    #[test]
    fn test_truncate_output() {
        assert_eq!(truncate_output(b"hello world", 1024), "hello world");

        let result = truncate_output(&vec![b'a'; 20], 10);
        assert!(result.starts_with("aaaaaaaaaa..."));
        assert!(result.contains("truncated"));
    }

    #[test]
    fn test_truncate_output_respects_char_boundary() {
        // "é" is two bytes; a limit of 3 falls inside the second one
        let result = truncate_output("éé".as_bytes(), 3);
        assert!(result.starts_with("é..."));
    }

    #[test]
    fn test_truncate_output_is_lossy() {
        let result = truncate_output(&[0x66, 0x6f, 0xff, 0x6f], 1024);
        assert_eq!(result, "fo\u{fffd}o");
    }
}
