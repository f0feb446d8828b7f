//! Workspace step - confirms the per-output working directory is usable.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// First step: the working directory is created (and later removed) by the
/// batch processor; this step only checks it is in place.
pub struct WorkspaceStep;

impl PipelineStep for WorkspaceStep {
    fn name(&self) -> &str {
        "Workspace"
    }

    fn description(&self) -> &str {
        "Prepare working directory"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if !ctx.product_dir.is_dir() {
            return Err(StepError::invalid_input(format!(
                "Product directory not found: {}",
                ctx.product_dir.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, _state: &mut RunState) -> StepResult<StepOutcome> {
        ctx.logger
            .info(&format!("Working directory: {}", ctx.work_dir.display()));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if !ctx.work_dir.is_dir() {
            return Err(StepError::invalid_output(format!(
                "Working directory missing: {}",
                ctx.work_dir.display()
            )));
        }
        Ok(())
    }
}
