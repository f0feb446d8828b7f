//! Stage operations: the catalog of media transforms.
//!
//! Each operation builds one ffmpeg [`Invocation`](crate::process::Invocation)
//! and hands it to the [`CommandRunner`]. Operations keep no state between
//! calls; every hand-off is an explicit file path.

pub mod args;
pub mod filter;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::{EncodingSettings, SubtitleSettings, ToolPaths};
use crate::process::{CommandFailure, CommandRunner, Invocation, OutputSink};
use crate::subtitles::force_style;

/// The seven media transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    SpeedAdjust,
    Trim,
    MuxAudio,
    Concatenate,
    BurnSubtitles,
    OverlayWatermark,
    MixBackgroundMusic,
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::SpeedAdjust => "Speed adjust",
            StageKind::Trim => "Trim",
            StageKind::MuxAudio => "Mux audio",
            StageKind::Concatenate => "Concatenate",
            StageKind::BurnSubtitles => "Burn subtitles",
            StageKind::OverlayWatermark => "Overlay watermark",
            StageKind::MixBackgroundMusic => "Mix background music",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error from a stage operation.
#[derive(Error, Debug)]
pub enum StageError {
    /// The external command failed to start or exited non-zero.
    #[error("{stage} failed: {failure}")]
    Execution {
        stage: StageKind,
        failure: CommandFailure,
    },

    /// The operation was given nothing to work on.
    #[error("{stage} has no input clips")]
    EmptyInput { stage: StageKind },

    /// Preparing the command failed.
    #[error("{stage}: I/O error while {operation}: {source}")]
    Io {
        stage: StageKind,
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    pub fn io(stage: StageKind, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            stage,
            operation: operation.into(),
            source,
        }
    }

    /// Stage this error came from.
    pub fn stage(&self) -> StageKind {
        match self {
            StageError::Execution { stage, .. }
            | StageError::EmptyInput { stage }
            | StageError::Io { stage, .. } => *stage,
        }
    }

    /// Full diagnostic text (command line and error stream when available).
    pub fn diagnostic(&self) -> String {
        match self {
            StageError::Execution { failure, .. } => failure.diagnostic(),
            other => other.to_string(),
        }
    }
}

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Runs stage operations through a [`CommandRunner`].
#[derive(Clone)]
pub struct StageExecutor {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: PathBuf,
    fonts_dir: Option<PathBuf>,
    encoding: EncodingSettings,
    subtitle: SubtitleSettings,
}

impl StageExecutor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        tools: &ToolPaths,
        encoding: EncodingSettings,
        subtitle: SubtitleSettings,
    ) -> Self {
        Self {
            runner,
            ffmpeg: tools.ffmpeg.clone(),
            fonts_dir: tools.fonts_dir.clone(),
            encoding,
            subtitle,
        }
    }

    /// Change playback speed so the output lasts `source_duration / factor`.
    pub fn speed_adjust(
        &self,
        source: &Path,
        factor: f64,
        source_duration: f64,
        output: &Path,
        sink: &dyn OutputSink,
    ) -> StageResult<PathBuf> {
        let invocation = args::speed_adjust(&self.ffmpeg, &self.encoding, source, factor, output)
            .expected_duration(source_duration / factor);
        self.run(StageKind::SpeedAdjust, invocation, sink)
    }

    /// Keep `duration` seconds starting at `start`.
    pub fn trim(
        &self,
        source: &Path,
        start: f64,
        duration: f64,
        output: &Path,
        sink: &dyn OutputSink,
    ) -> StageResult<PathBuf> {
        let invocation = args::trim(&self.ffmpeg, &self.encoding, source, start, duration, output);
        self.run(StageKind::Trim, invocation, sink)
    }

    /// Replace the clip's audio with `audio`.
    pub fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        duration: f64,
        output: &Path,
        sink: &dyn OutputSink,
    ) -> StageResult<PathBuf> {
        let invocation = args::mux_audio(&self.ffmpeg, &self.encoding, video, audio, output)
            .expected_duration(duration);
        self.run(StageKind::MuxAudio, invocation, sink)
    }

    /// Join same-codec clips in order.
    ///
    /// The concat list is written next to `output` and removed afterwards.
    pub fn concatenate(
        &self,
        clips: &[PathBuf],
        total_duration: f64,
        output: &Path,
        sink: &dyn OutputSink,
    ) -> StageResult<PathBuf> {
        let stage = StageKind::Concatenate;
        if clips.is_empty() {
            return Err(StageError::EmptyInput { stage });
        }

        let list = output.with_file_name("filelist.txt");
        fs::write(&list, filter::concat_list(clips))
            .map_err(|e| StageError::io(stage, "writing concat list", e))?;

        let invocation =
            args::concatenate(&self.ffmpeg, &list, clips, output).expected_duration(total_duration);
        self.run(stage, invocation, sink)
    }

    /// Burn the SRT track into the video with the configured style.
    pub fn burn_subtitles(
        &self,
        video: &Path,
        srt: &Path,
        duration: f64,
        output: &Path,
        sink: &dyn OutputSink,
    ) -> StageResult<PathBuf> {
        let style = force_style(&self.subtitle);
        let invocation = args::burn_subtitles(
            &self.ffmpeg,
            &self.encoding,
            video,
            srt,
            self.fonts_dir.as_deref(),
            (self.subtitle.play_res_x, self.subtitle.play_res_y),
            &style,
            output,
        )
        .expected_duration(duration);
        self.run(StageKind::BurnSubtitles, invocation, sink)
    }

    /// Overlay `image` at `position` for the whole video.
    pub fn overlay_watermark(
        &self,
        video: &Path,
        image: &Path,
        position: &str,
        duration: f64,
        output: &Path,
        sink: &dyn OutputSink,
    ) -> StageResult<PathBuf> {
        let invocation =
            args::overlay_watermark(&self.ffmpeg, &self.encoding, video, image, position, output)
                .expected_duration(duration);
        self.run(StageKind::OverlayWatermark, invocation, sink)
    }

    /// Mix looped `music` at `volume` under the video's audio.
    pub fn mix_background_music(
        &self,
        video: &Path,
        music: &Path,
        volume: f64,
        duration: f64,
        output: &Path,
        sink: &dyn OutputSink,
    ) -> StageResult<PathBuf> {
        let invocation =
            args::mix_background_music(&self.ffmpeg, &self.encoding, video, music, volume, output)
                .expected_duration(duration);
        self.run(StageKind::MixBackgroundMusic, invocation, sink)
    }

    fn run(
        &self,
        stage: StageKind,
        invocation: Invocation,
        sink: &dyn OutputSink,
    ) -> StageResult<PathBuf> {
        let output = invocation.output.clone().ok_or_else(|| {
            StageError::io(
                stage,
                "building command",
                io::Error::new(io::ErrorKind::InvalidInput, "no output path"),
            )
        })?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StageError::io(stage, "creating output directory", e))?;
        }

        self.runner
            .run(&invocation, sink)
            .into_result()
            .map_err(|failure| StageError::Execution { stage, failure })?;

        Ok(output)
    }
}
