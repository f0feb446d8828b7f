//! Concatenate step - joins the muxed scene clips.

use std::path::PathBuf;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Joins all scene clips in order into `merge.mp4`.
pub struct ConcatenateStep;

impl PipelineStep for ConcatenateStep {
    fn name(&self) -> &str {
        "Concatenate"
    }

    fn description(&self) -> &str {
        "Concatenate scene clips"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.processed.is_empty() {
            return Err(StepError::EmptyComposition);
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let clips: Vec<PathBuf> = state.processed.iter().map(|p| p.clip.clone()).collect();
        let total = state.total_duration();

        ctx.logger.info(&format!(
            "Joining {} clip(s), {:.2}s total",
            clips.len(),
            total
        ));
        let merged = ctx.stages.concatenate(
            &clips,
            total,
            &ctx.work_file("merge.mp4"),
            &*ctx.logger,
        )?;

        state.merged = Some(merged);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match &state.merged {
            Some(path) if path.exists() => Ok(()),
            Some(path) => Err(StepError::invalid_output(format!(
                "Merged video not found: {}",
                path.display()
            ))),
            None => Err(StepError::invalid_output("Merged video not recorded")),
        }
    }
}
