//! Core types for the orchestrator pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::CompositionSettings;
use crate::events::PipelineEvent;
use crate::logging::RunLogger;
use crate::models::{ProcessedScene, Scene};
use crate::probe::MediaProbe;
use crate::stages::StageExecutor;

use super::selection::AssetSelector;

/// Read-only context passed to pipeline steps.
///
/// Contains the output's configuration and shared services that steps can
/// use but not modify. Mutable state goes in `RunState`.
pub struct Context {
    /// Product directory holding the scene folders.
    pub product_dir: PathBuf,
    /// Product name (directory name), used in the output file name.
    pub product_name: String,
    /// 1-based index of this output in the batch.
    pub output_index: usize,
    /// Number of outputs in the batch.
    pub output_count: usize,
    /// Private working directory for this output.
    pub work_dir: PathBuf,
    /// Folder receiving finished outputs.
    pub output_dir: PathBuf,
    /// Layout and mix settings.
    pub composition: CompositionSettings,
    /// Stage operations.
    pub stages: Arc<StageExecutor>,
    /// Duration probe.
    pub probe: Arc<dyn MediaProbe>,
    /// Asset picking strategy.
    pub selector: Arc<dyn AssetSelector>,
    /// Per-batch logger.
    pub logger: Arc<RunLogger>,
}

impl Context {
    /// Path of a file inside the working directory.
    pub fn work_file(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Operation name used for pipeline-level progress ("Output k/N").
    pub fn progress_label(&self) -> String {
        format!("Output {}/{}", self.output_index, self.output_count)
    }

    /// Report pipeline-level progress for this output.
    pub fn report_progress(&self, percent: u32) {
        self.logger
            .publish(PipelineEvent::progress(self.progress_label(), percent));
    }
}

/// Mutable state that accumulates results from pipeline steps.
///
/// Each step records its output in its own field; later steps read them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Scenes with their selected assets (step 2).
    pub scenes: Vec<Scene>,
    /// Scene names skipped for missing assets (step 2).
    pub skipped_scenes: Vec<String>,
    /// Conformed and muxed scene clips in order (step 3).
    pub processed: Vec<ProcessedScene>,
    /// Concatenated video (step 4).
    pub merged: Option<PathBuf>,
    /// Generated SRT track (step 5).
    pub subtitle_track: Option<PathBuf>,
    /// Video with burned subtitles (step 5).
    pub subtitled: Option<PathBuf>,
    /// Video with watermark, if one was applied (step 6).
    pub watermarked: Option<PathBuf>,
    /// Finished file in the output folder (step 7).
    pub final_output: Option<PathBuf>,
}

impl RunState {
    /// Total length of the composition (sum of narration durations).
    pub fn total_duration(&self) -> f64 {
        self.processed.iter().map(|p| p.audio_duration).sum()
    }

    /// Most processed version of the video so far.
    pub fn latest_video(&self) -> Option<&Path> {
        self.watermarked
            .as_deref()
            .or(self.subtitled.as_deref())
            .or(self.merged.as_deref())
    }
}

/// Outcome of a step execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}
