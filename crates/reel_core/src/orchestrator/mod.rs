//! Pipeline orchestrator for generating videos from a product folder.
//!
//! Each output runs the same seven steps in a private working directory.
//! Steps validate, execute, and record their results in a shared
//! [`RunState`]; every hand-off between them is a file path.
//!
//! # Architecture
//!
//! ```text
//! BatchController (worker thread, start/stop, events)
//!     └── BatchProcessor (outputs 1..=N, failure isolation)
//!         └── Pipeline (per output, inside temp_<k>_xxxxxx/)
//!             ├── Step: Workspace
//!             ├── Step: Select scenes
//!             ├── Step: Conform scenes
//!             ├── Step: Concatenate
//!             ├── Step: Subtitles
//!             ├── Step: Watermark (optional)
//!             └── Step: Finalize
//! ```
//!
//! # Example
//!
//! ```ignore
//! use reel_core::orchestrator::{BatchController, BatchProcessor, BatchRequest};
//!
//! let controller = BatchController::new(BatchProcessor::system(settings, &tools));
//! let events = controller.subscribe();
//! let handle = controller.start(BatchRequest::new("/videos/coffee", 3))?;
//! let summary = handle.wait()?;
//! println!("Produced: {:?}", summary.produced);
//! ```

mod batch;
mod errors;
mod numbering;
mod pipeline;
mod selection;
mod step;
pub mod steps;
mod types;
mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{
    BatchController, BatchHandle, BatchProcessor, BatchRequest, BatchState, BatchSummary,
    CancelHandle, FailedOutput,
};
pub use errors::{BatchError, OutputError, OutputResult, StepError, StepResult};
pub use numbering::{next_output_number, output_file_name};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use selection::{
    is_scene_name, list_candidates, list_scene_dirs, pick_asset, AssetSelector, FirstSelector,
    RandomSelector,
};
pub use step::PipelineStep;
pub use steps::{
    ConcatenateStep, ConformScenesStep, FinalizeStep, SelectScenesStep, SubtitlesStep,
    WatermarkStep, WorkspaceStep,
};
pub use types::{Context, RunState, StepOutcome};
pub use workspace::TempWorkspace;

/// Create the standard pipeline with all steps in the correct order.
///
/// 1. Workspace - check the per-output working directory
/// 2. Select scenes - pick narration and footage per scene folder
/// 3. Conform scenes - speed-adjust or trim footage, mux narration
/// 4. Concatenate - join scene clips
/// 5. Subtitles - synthesize and burn captions
/// 6. Watermark - overlay the product image (optional)
/// 7. Finalize - mix background music, save the numbered output
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(WorkspaceStep)
        .with_step(SelectScenesStep)
        .with_step(ConformScenesStep)
        .with_step(ConcatenateStep)
        .with_step(SubtitlesStep)
        .with_step(WatermarkStep)
        .with_step(FinalizeStep)
}
