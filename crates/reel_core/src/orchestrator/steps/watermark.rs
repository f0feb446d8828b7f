//! Watermark step - overlays a product-level image, if there is one.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::selection::pick_asset;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Overlays a randomly chosen root-level image onto the subtitled video,
/// writing `merge_subtitle_watermark.mp4`. Skipped when no image exists.
pub struct WatermarkStep;

impl PipelineStep for WatermarkStep {
    fn name(&self) -> &str {
        "Watermark"
    }

    fn description(&self) -> &str {
        "Overlay watermark"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.subtitled.is_none() {
            return Err(StepError::invalid_input("No subtitled video to watermark"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let composition = &ctx.composition;
        let image = pick_asset(
            &ctx.product_dir,
            &composition.watermark_extensions,
            ctx.selector.as_ref(),
        )
        .map_err(|e| StepError::io_error("looking for watermark image", e))?;

        let Some(image) = image else {
            return Ok(StepOutcome::Skipped(
                "no watermark image in the product folder".to_string(),
            ));
        };
        let Some(video) = state.subtitled.clone() else {
            return Err(StepError::invalid_input("No subtitled video to watermark"));
        };

        ctx.logger
            .info(&format!("Watermark: {}", image.display()));
        let watermarked = ctx.stages.overlay_watermark(
            &video,
            &image,
            &composition.watermark_position,
            state.total_duration(),
            &ctx.work_file("merge_subtitle_watermark.mp4"),
            &*ctx.logger,
        )?;
        state.watermarked = Some(watermarked);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.watermarked.is_none() {
            return Err(StepError::invalid_output("Watermarked video not recorded"));
        }
        Ok(())
    }

    fn is_optional(&self) -> bool {
        true
    }
}
