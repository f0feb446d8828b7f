//! Conform step - fits each scene's footage to its narration and muxes them.

use crate::models::{ProcessedScene, TimingDecision};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Probes, speed-adjusts or trims, then muxes every selected scene.
///
/// Produces `process_NNN.mp4` (footage only) and `scene_NNN.mp4` (footage
/// with narration) per scene, numbered from 1 in scene order.
pub struct ConformScenesStep;

impl PipelineStep for ConformScenesStep {
    fn name(&self) -> &str {
        "Conform scenes"
    }

    fn description(&self) -> &str {
        "Conform scene clips to narration"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if !state.processed.is_empty() {
            return Err(StepError::invalid_input("Scenes were already processed"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let total = state.scenes.len();
        let sink = &*ctx.logger;

        for (i, scene) in state.scenes.iter().enumerate() {
            let number = i + 1;
            ctx.logger
                .section(&format!("Scene {} ({}/{})", scene.name, number, total));

            let audio_duration = ctx.probe.duration(&scene.audio)?;
            let video_duration = ctx.probe.duration(&scene.video)?;
            let decision = TimingDecision::decide(video_duration, audio_duration);

            let processed = ctx.work_file(&format!("process_{:03}.mp4", number));
            match decision {
                TimingDecision::SpeedAdjust { factor } => {
                    ctx.logger.info(&format!(
                        "Footage {:.2}s shorter than narration {:.2}s, speed factor {:.4}",
                        video_duration, audio_duration, factor
                    ));
                    ctx.stages
                        .speed_adjust(&scene.video, factor, video_duration, &processed, sink)?;
                }
                TimingDecision::Trim {
                    start_offset,
                    duration,
                } => {
                    ctx.logger.info(&format!(
                        "Footage {:.2}s, narration {:.2}s, trimming from {:.3}s",
                        video_duration, audio_duration, start_offset
                    ));
                    ctx.stages
                        .trim(&scene.video, start_offset, duration, &processed, sink)?;
                }
            }

            let clip = ctx.work_file(&format!("scene_{:03}.mp4", number));
            ctx.stages
                .mux_audio(&processed, &scene.audio, audio_duration, &clip, sink)?;

            state.processed.push(ProcessedScene {
                scene: scene.clone(),
                audio_duration,
                video_duration,
                decision,
                clip,
            });
        }

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.processed.len() != state.scenes.len() {
            return Err(StepError::invalid_output(format!(
                "{} of {} scenes processed",
                state.processed.len(),
                state.scenes.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scene;
    use crate::orchestrator::testing::{context_with, FakeProbe, FakeRunner};
    use crate::probe::InspectionError;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn two_scenes(dir: &std::path::Path) -> RunState {
        RunState {
            scenes: vec![
                Scene::new("A", dir.join("A/short.mp3"), dir.join("A/long.mp4")),
                Scene::new("B", dir.join("B/long.mp3"), dir.join("B/short.mp4")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn trims_long_footage_and_slows_short_footage() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let probe = FakeProbe::new()
            .with("short.mp3", 4.0)
            .with("long.mp4", 10.0)
            .with("long.mp3", 6.0)
            .with("short.mp4", 3.0);
        let (ctx, _rx) = context_with(dir.path(), runner.clone(), probe);
        let mut state = two_scenes(dir.path());

        ConformScenesStep.execute(&ctx, &mut state).unwrap();

        assert_eq!(
            state.processed[0].decision,
            TimingDecision::Trim {
                start_offset: 3.0,
                duration: 4.0
            }
        );
        assert_eq!(
            state.processed[1].decision,
            TimingDecision::SpeedAdjust { factor: 0.5 }
        );
        assert_eq!(state.processed[1].clip, ctx.work_file("scene_002.mp4"));
        assert_eq!(
            runner.labels(),
            vec!["Trim", "Mux audio", "Speed adjust", "Mux audio"]
        );
        assert!(ConformScenesStep.validate_output(&ctx, &state).is_ok());
    }

    #[test]
    fn probe_failure_fails_the_step() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let probe = FakeProbe::new().with("short.mp3", 4.0);
        let (ctx, _rx) = context_with(dir.path(), runner.clone(), probe);
        let mut state = two_scenes(dir.path());

        let err = ConformScenesStep.execute(&ctx, &mut state).unwrap_err();

        assert!(matches!(
            err,
            StepError::Inspection(InspectionError::ProbeFailed { .. })
        ));
        assert!(runner.labels().is_empty());
    }
}
