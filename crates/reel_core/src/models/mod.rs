//! Data models for Reelsmith.
//!
//! This module contains the core data structures shared by the pipeline:
//! - Asset kinds and selected scenes
//! - Processed scene records handed from clip conforming to subtitles
//! - Per-scene timing decisions

mod media;
mod timing;

pub use media::{AssetKind, ProcessedScene, Scene};
pub use timing::TimingDecision;
