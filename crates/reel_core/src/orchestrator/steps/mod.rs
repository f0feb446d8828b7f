//! Pipeline step implementations.
//!
//! One step per stage of the per-output protocol, in execution order.

mod concatenate;
mod conform;
mod finalize;
mod select;
mod subtitles;
mod watermark;
mod workspace;

pub use concatenate::ConcatenateStep;
pub use conform::ConformScenesStep;
pub use finalize::FinalizeStep;
pub use select::SelectScenesStep;
pub use subtitles::SubtitlesStep;
pub use watermark::WatermarkStep;
pub use workspace::WorkspaceStep;
