//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Batch → Output → Step → Stage/Probe → Detail

use std::io;

use thiserror::Error;

use crate::models::AssetKind;
use crate::probe::InspectionError;
use crate::stages::StageError;

/// Failure of one output. Never fatal to the batch.
#[derive(Error, Debug)]
pub enum OutputError {
    /// A step failed during execution.
    #[error("Output {index} failed at step '{step}': {source}")]
    StepFailed {
        index: usize,
        step: String,
        #[source]
        source: StepError,
    },

    /// The output could not be set up (temp directory, etc.).
    #[error("Output {index} setup failed: {message}")]
    SetupFailed { index: usize, message: String },
}

impl OutputError {
    /// Create a step failed error.
    pub fn step_failed(index: usize, step: impl Into<String>, source: StepError) -> Self {
        Self::StepFailed {
            index,
            step: step.into(),
            source,
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(index: usize, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            index,
            message: message.into(),
        }
    }

    /// Output index (1-based).
    pub fn index(&self) -> usize {
        match self {
            OutputError::StepFailed { index, .. } | OutputError::SetupFailed { index, .. } => *index,
        }
    }

    /// Full diagnostic text for logs.
    pub fn diagnostic(&self) -> String {
        match self {
            OutputError::StepFailed { source, .. } => source.diagnostic(),
            other => other.to_string(),
        }
    }
}

/// Error from a pipeline step.
#[derive(Error, Debug)]
pub enum StepError {
    /// A scene lacks a required asset. Reported as a warning; the scene is skipped.
    #[error("Scene {scene} has no {kind} file")]
    AssetMissing { scene: String, kind: AssetKind },

    /// Probing a media file failed.
    #[error(transparent)]
    Inspection(#[from] InspectionError),

    /// A stage operation failed.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// No scene produced a usable clip.
    #[error("No usable scenes to compose (check the A, B, C... folders)")]
    EmptyComposition,

    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    /// Create an asset missing error.
    pub fn asset_missing(scene: impl Into<String>, kind: AssetKind) -> Self {
        Self::AssetMissing {
            scene: scene.into(),
            kind,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Full diagnostic text (includes the command's error stream for stage failures).
    pub fn diagnostic(&self) -> String {
        match self {
            StepError::Stage(e) => e.diagnostic(),
            other => other.to_string(),
        }
    }
}

/// Errors from the batch control surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// A batch is already running on this controller.
    #[error("A batch is already running")]
    Busy,

    /// The request cannot be started.
    #[error("Invalid batch request: {0}")]
    InvalidRequest(String),

    /// The worker thread panicked before producing a summary.
    #[error("Batch worker panicked")]
    WorkerPanicked,
}

impl BatchError {
    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for a single output.
pub type OutputResult<T> = Result<T, OutputError>;
