//! Finalize step - mixes background music and publishes the numbered output.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::numbering::{next_output_number, output_file_name};
use crate::orchestrator::selection::pick_asset;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Produces `final.mp4` in the working directory (music mix, or a plain copy
/// when the product has no music) and moves it to
/// `<output folder>/NNN--<product>.mp4`.
pub struct FinalizeStep;

impl PipelineStep for FinalizeStep {
    fn name(&self) -> &str {
        "Finalize"
    }

    fn description(&self) -> &str {
        "Mix background music and save output"
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.latest_video().is_none() {
            return Err(StepError::invalid_input("No video to finalize"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let Some(video) = state.latest_video().map(Path::to_path_buf) else {
            return Err(StepError::invalid_input("No video to finalize"));
        };
        let composition = &ctx.composition;
        let staged = ctx.work_file("final.mp4");

        let music = pick_asset(
            &ctx.product_dir,
            &composition.music_extensions,
            ctx.selector.as_ref(),
        )
        .map_err(|e| StepError::io_error("looking for background music", e))?;

        match music {
            Some(music) => {
                ctx.logger
                    .info(&format!("Background music: {}", music.display()));
                ctx.stages.mix_background_music(
                    &video,
                    &music,
                    composition.music_volume,
                    state.total_duration(),
                    &staged,
                    &*ctx.logger,
                )?;
            }
            None => {
                ctx.logger
                    .warn("No background music in the product folder, keeping narration only");
                fs::copy(&video, &staged)
                    .map_err(|e| StepError::io_error("copying final video", e))?;
            }
        }

        fs::create_dir_all(&ctx.output_dir)
            .map_err(|e| StepError::io_error("creating output folder", e))?;
        let number = next_output_number(&ctx.output_dir)
            .map_err(|e| StepError::io_error("reading output folder", e))?;
        let destination = ctx
            .output_dir
            .join(output_file_name(number, &ctx.product_name));

        move_file(&staged, &destination)
            .map_err(|e| StepError::io_error("saving output", e))?;

        ctx.logger
            .success(&format!("Saved {}", destination.display()));
        state.final_output = Some(destination);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match &state.final_output {
            Some(path) if path.is_file() => Ok(()),
            Some(path) => Err(StepError::invalid_output(format!(
                "Output file not found: {}",
                path.display()
            ))),
            None => Err(StepError::invalid_output("Output file not recorded")),
        }
    }
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<PathBuf> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(to.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::{context_with, FakeProbe, FakeRunner};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn state_with_video(ctx: &Context, content: &[u8]) -> RunState {
        let video = ctx.work_file("merge_subtitle.mp4");
        fs::write(&video, content).unwrap();
        RunState {
            subtitled: Some(video),
            ..Default::default()
        }
    }

    #[test]
    fn copies_when_no_music_and_numbers_output() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let (ctx, _rx) = context_with(dir.path(), runner.clone(), FakeProbe::new());
        fs::create_dir_all(&ctx.output_dir).unwrap();
        fs::write(ctx.output_dir.join("001--x.mp4"), b"").unwrap();
        fs::write(ctx.output_dir.join("003--x.mp4"), b"").unwrap();
        let mut state = state_with_video(&ctx, b"subtitled");

        FinalizeStep.execute(&ctx, &mut state).unwrap();

        let expected = ctx
            .output_dir
            .join(format!("004--{}.mp4", ctx.product_name));
        assert_eq!(state.final_output.as_deref(), Some(expected.as_path()));
        assert_eq!(fs::read(&expected).unwrap(), b"subtitled");
        assert!(!ctx.work_file("final.mp4").exists());
        assert!(runner.labels().is_empty());
        assert!(FinalizeStep.validate_output(&ctx, &state).is_ok());
    }

    #[test]
    fn mixes_music_when_present() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bgm.mp3"), b"").unwrap();
        let runner = Arc::new(FakeRunner::new());
        let (ctx, _rx) = context_with(dir.path(), runner.clone(), FakeProbe::new());
        let mut state = state_with_video(&ctx, b"subtitled");

        FinalizeStep.execute(&ctx, &mut state).unwrap();

        assert_eq!(runner.labels(), vec!["Mix background music"]);
        let output = state.final_output.unwrap();
        assert!(output.ends_with(format!("001--{}.mp4", ctx.product_name)));
        assert!(output.is_file());
    }

    #[test]
    fn failed_mix_leaves_output_folder_untouched() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bgm.mp3"), b"").unwrap();
        let runner = Arc::new(FakeRunner::new().fail_stage("Mix background music"));
        let (ctx, _rx) = context_with(dir.path(), runner, FakeProbe::new());
        let mut state = state_with_video(&ctx, b"subtitled");

        assert!(FinalizeStep.execute(&ctx, &mut state).is_err());
        assert!(!ctx.output_dir.exists());
        assert!(state.final_output.is_none());
    }
}
