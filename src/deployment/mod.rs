//! Configured deployments and named workflows
//!
//! Deployment profiles map a deployment type to one shell command. Named
//! workflows are ordered step lists that run fail-fast.

use std::collections::BTreeMap;
use tracing::{info, Instrument};

use crate::config::types::{SystemConfig, WorkflowConfig};
use crate::execution::CommandExecutor;
use crate::logging::workflow_span;
use crate::orchestration::run_workflow;
use crate::types::{CommandSpec, Error, ExecutionResult, Result, WorkflowReport};

/// DeploymentManager resolves configured profiles and workflows to executions
#[derive(Clone)]
pub struct DeploymentManager {
    executor: CommandExecutor,
    profiles: BTreeMap<String, String>,
    workflows: BTreeMap<String, WorkflowConfig>,
}

impl DeploymentManager {
    pub fn new(
        executor: CommandExecutor,
        profiles: BTreeMap<String, String>,
        workflows: BTreeMap<String, WorkflowConfig>,
    ) -> Self {
        Self {
            executor,
            profiles,
            workflows,
        }
    }

    pub fn from_config(executor: CommandExecutor, config: &SystemConfig) -> Self {
        Self::new(
            executor,
            config.deploy.profiles.clone(),
            config.workflows.clone(),
        )
    }

    pub fn workflow_names(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }

    /// Look up a deployment profile command
    fn find_profile(&self, kind: &str) -> Result<&str> {
        self.profiles
            .get(kind)
            .map(String::as_str)
            .ok_or_else(|| Error::Validation {
                field: "type".to_string(),
                message: "Invalid deployment type".to_string(),
            })
    }

    /// Run the command configured for `kind` on `host`
    pub async fn deploy(&self, host: &str, kind: &str) -> Result<ExecutionResult> {
        let command = self.find_profile(kind)?;

        info!(host = %host, deploy_type = %kind, "Starting deployment");

        let result = self
            .executor
            .execute(&CommandSpec::new(host, command))
            .await;

        info!(
            host = %host,
            deploy_type = %kind,
            success = result.success(),
            "Deployment finished"
        );

        Ok(result)
    }

    /// Run a configured workflow fail-fast
    pub async fn run_named_workflow(&self, name: &str) -> Result<WorkflowReport> {
        let workflow = self
            .workflows
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Workflow '{}' is not configured", name)))?;

        let steps: Vec<CommandSpec> = workflow.steps.clone();

        let span = workflow_span(name);
        let report = async {
            info!(
                steps = steps.len(),
                description = workflow.description.as_deref().unwrap_or(""),
                "Starting workflow"
            );
            run_workflow(&self.executor, steps).await
        }
        .instrument(span)
        .await;

        Ok(report)
    }
}
