//! Multi-step execution
//!
//! A batch runs every step concurrently and reports all of them. A workflow
//! runs steps one after another and stops at the first failure.

use futures::future::join_all;
use tracing::{info, warn};

use crate::execution::CommandExecutor;
use crate::types::{BatchReport, CommandSpec, StepResult, WorkflowReport};

/// Run every step, collecting one result per step in input order
pub async fn run_batch(executor: &CommandExecutor, steps: Vec<CommandSpec>) -> BatchReport {
    let outcomes = join_all(steps.iter().map(|spec| executor.execute(spec))).await;

    let results: Vec<StepResult> = steps
        .into_iter()
        .zip(outcomes)
        .map(|(spec, result)| StepResult::new(spec, result))
        .collect();

    let report = BatchReport::from_results(results);
    let failed = report.failed_count();

    info!(
        steps = report.results.len(),
        failed = failed,
        "Batch finished"
    );
    crate::metrics::record_orchestration("batch", failed == 0);

    report
}

/// Run steps strictly in order, halting at the first unsuccessful one
pub async fn run_workflow(executor: &CommandExecutor, steps: Vec<CommandSpec>) -> WorkflowReport {
    let total = steps.len();
    let mut completed = Vec::with_capacity(total);

    for (index, spec) in steps.into_iter().enumerate() {
        let result = executor.execute(&spec).await;
        let failed = !result.success();

        if failed {
            warn!(
                step = index + 1,
                total = total,
                host = %spec.host,
                error = %result.error(),
                "Workflow step failed, skipping remaining steps"
            );
        }

        completed.push(StepResult::new(spec, result));

        if failed {
            break;
        }
    }

    let report = WorkflowReport::from_steps(completed);

    info!(
        success = report.success,
        steps_run = report.steps.len(),
        steps_total = total,
        "Workflow finished"
    );
    crate::metrics::record_orchestration("workflow", report.success);

    report
}
