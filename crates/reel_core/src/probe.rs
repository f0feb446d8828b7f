//! Media duration inspection via ffprobe.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// Errors from probing a media file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InspectionError {
    #[error("Media file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("ffprobe failed on {}: {message}", .path.display())]
    ProbeFailed { path: PathBuf, message: String },

    #[error("No duration reported for {}", .0.display())]
    MissingDuration(PathBuf),

    #[error("Invalid duration '{value}' for {}", .path.display())]
    InvalidDuration { path: PathBuf, value: String },
}

/// Result type for probe operations.
pub type InspectionResult<T> = Result<T, InspectionError>;

/// Answers "how long is this file".
pub trait MediaProbe: Send + Sync {
    /// Duration in seconds.
    fn duration(&self, path: &Path) -> InspectionResult<f64>;
}

/// Probe backed by the ffprobe executable.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    ffprobe: PathBuf,
}

impl FfprobeProbe {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }
}

impl MediaProbe for FfprobeProbe {
    fn duration(&self, path: &Path) -> InspectionResult<f64> {
        if !path.exists() {
            return Err(InspectionError::NotFound(path.to_path_buf()));
        }

        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| InspectionError::ProbeFailed {
                path: path.to_path_buf(),
                message: format!("failed to run {}: {}", self.ffprobe.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InspectionError::ProbeFailed {
                path: path.to_path_buf(),
                message: match output.status.code() {
                    Some(code) => format!("exit code {}: {}", code, stderr.trim()),
                    None => format!("terminated: {}", stderr.trim()),
                },
            });
        }

        let duration = parse_duration(path, &String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!("Duration of {}: {:.3}s", path.display(), duration);
        Ok(duration)
    }
}

/// Parse ffprobe's bare `format=duration` output.
pub fn parse_duration(path: &Path, stdout: &str) -> InspectionResult<f64> {
    let value = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| InspectionError::MissingDuration(path.to_path_buf()))?;

    if value.eq_ignore_ascii_case("N/A") {
        return Err(InspectionError::MissingDuration(path.to_path_buf()));
    }

    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(InspectionError::InvalidDuration {
            path: path.to_path_buf(),
            value: value.to_string(),
        }),
    }
}
