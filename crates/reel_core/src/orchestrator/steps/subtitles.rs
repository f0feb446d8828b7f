//! Subtitles step - synthesizes the caption track and burns it in.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};
use crate::subtitles::{self, CueSpec};

/// Writes `subtitles.srt` from the scene captions and narration lengths,
/// then renders it into `merge_subtitle.mp4`.
pub struct SubtitlesStep;

impl PipelineStep for SubtitlesStep {
    fn name(&self) -> &str {
        "Subtitles"
    }

    fn description(&self) -> &str {
        "Burn subtitles"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.merged.is_none() {
            return Err(StepError::invalid_input("No merged video to subtitle"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let Some(merged) = state.merged.clone() else {
            return Err(StepError::invalid_input("No merged video to subtitle"));
        };

        let specs: Vec<CueSpec> = state
            .processed
            .iter()
            .map(|p| CueSpec::new(p.caption(), p.audio_duration))
            .collect();
        let track = ctx.work_file("subtitles.srt");
        subtitles::write_file(&specs, &track)
            .map_err(|e| StepError::io_error("writing subtitle track", e))?;
        ctx.logger
            .debug(&format!("Wrote {} cue(s) to {}", specs.len(), track.display()));
        state.subtitle_track = Some(track.clone());

        let subtitled = ctx.stages.burn_subtitles(
            &merged,
            &track,
            state.total_duration(),
            &ctx.work_file("merge_subtitle.mp4"),
            &*ctx.logger,
        )?;
        state.subtitled = Some(subtitled);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.subtitled.is_none() {
            return Err(StepError::invalid_output("Subtitled video not recorded"));
        }
        Ok(())
    }
}
