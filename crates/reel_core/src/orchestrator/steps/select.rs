//! Select step - picks one narration and one backdrop per scene folder.

use crate::models::{AssetKind, Scene};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::selection::{list_scene_dirs, pick_asset};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Enumerates scene folders in name order and selects their assets.
///
/// A scene lacking either asset is skipped with a warning; the step itself
/// only fails on I/O errors.
pub struct SelectScenesStep;

impl PipelineStep for SelectScenesStep {
    fn name(&self) -> &str {
        "Select scenes"
    }

    fn description(&self) -> &str {
        "Select scene assets"
    }

    fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let composition = &ctx.composition;
        let folders = list_scene_dirs(&ctx.product_dir)
            .map_err(|e| StepError::io_error("listing scene folders", e))?;

        for (name, dir) in folders {
            let audio = pick_asset(&dir, &composition.audio_extensions, ctx.selector.as_ref())
                .map_err(|e| StepError::io_error(format!("reading scene {}", name), e))?;
            let video = pick_asset(&dir, &composition.video_extensions, ctx.selector.as_ref())
                .map_err(|e| StepError::io_error(format!("reading scene {}", name), e))?;

            match (audio, video) {
                (Some(audio), Some(video)) => {
                    ctx.logger.debug(&format!(
                        "Scene {}: {} + {}",
                        name,
                        file_name(&audio),
                        file_name(&video)
                    ));
                    state.scenes.push(Scene::new(name, audio, video));
                }
                (audio, _) => {
                    let kind = if audio.is_none() {
                        AssetKind::Audio
                    } else {
                        AssetKind::Video
                    };
                    let skipped = StepError::asset_missing(name.clone(), kind);
                    ctx.logger.warn(&format!("{}, skipping", skipped));
                    state.skipped_scenes.push(name);
                }
            }
        }

        ctx.logger.info(&format!(
            "Selected {} scene(s), skipped {}",
            state.scenes.len(),
            state.skipped_scenes.len()
        ));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
        Ok(())
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PipelineEvent, Severity};
    use crate::orchestrator::testing::context_for;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn selects_in_name_order_and_skips_incomplete() {
        let dir = tempdir().unwrap();
        for (scene, files) in [
            ("B", vec!["two.mp3", "b.mp4"]),
            ("A", vec!["one.mp3", "a.mp4"]),
            ("C", vec!["three.mp3"]),
        ] {
            let scene_dir = dir.path().join(scene);
            fs::create_dir(&scene_dir).unwrap();
            for file in files {
                fs::write(scene_dir.join(file), b"").unwrap();
            }
        }

        let (ctx, rx) = context_for(dir.path());
        let mut state = RunState::default();
        SelectScenesStep.execute(&ctx, &mut state).unwrap();

        let names: Vec<&str> = state.scenes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(state.scenes[0].caption(), "one");
        assert_eq!(state.skipped_scenes, vec!["C"]);

        let warned = rx.try_iter().any(|e| {
            matches!(e, PipelineEvent::Log { ref message, severity: Severity::Warning }
                if message.contains("Scene C has no video file"))
        });
        assert!(warned);
    }
}
