//! Local prepare and execute of monthly contexts, outside the orchestrator.

use ctp_monthly::{Computation, JobResult, TaskOutputs};
use tracing::{debug, error, info};

/// Which contexts to run and which phases to skip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalRunOptions {
    /// Run every context instead of only the first
    pub all: bool,
    /// Skip the standalone input-resolution report
    pub skip_prepare: bool,
    /// Resolve inputs only, never run the tool
    pub skip_execute: bool,
}

/// Outcome counts of a local run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalRunSummary {
    pub attempted: usize,
    pub prepared: usize,
    pub executed: usize,
    pub failed: usize,
}

/// Prepare and execute the selected contexts in order.
///
/// A failing context is logged and the loop moves on to the next one.
pub async fn run_contexts<C>(
    computation: &C,
    contexts: &[C::Context],
    options: LocalRunOptions,
) -> LocalRunSummary
where
    C: Computation,
{
    let mut summary = LocalRunSummary::default();
    let selected = if options.all {
        contexts
    } else {
        &contexts[..contexts.len().min(1)]
    };

    for (idx, context) in selected.iter().enumerate() {
        summary.attempted += 1;
        info!(index = idx, context = %context, "Running context");

        match run_one(computation, context, options, &mut summary).await {
            Ok(Some(outputs)) => {
                info!(context = %context, output = %outputs.out.display(), "Context complete");
            }
            Ok(None) => {}
            Err(e) => {
                summary.failed += 1;
                error!(context = %context, error = %e, "Context failed");
            }
        }
    }

    summary
}

async fn run_one<C>(
    computation: &C,
    context: &C::Context,
    options: LocalRunOptions,
    summary: &mut LocalRunSummary,
) -> JobResult<Option<TaskOutputs>>
where
    C: Computation,
{
    let mut inputs = None;

    if !options.skip_prepare {
        let resolved = computation.build_task(context).await?;
        for (label, path) in resolved.iter() {
            debug!(label, path = %path.display(), "Input");
        }
        info!(inputs = resolved.len(), "Prepared context");
        summary.prepared += 1;
        inputs = Some(resolved);
    }

    if options.skip_execute {
        return Ok(None);
    }

    let inputs = match inputs {
        Some(inputs) => inputs,
        None => computation.build_task(context).await?,
    };
    let outputs = computation.run_task(&inputs, context).await?;
    summary.executed += 1;
    Ok(Some(outputs))
}
