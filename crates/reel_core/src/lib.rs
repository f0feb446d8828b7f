//! Reelsmith Core - scene assembly pipeline
//!
//! Builds short videos from a product folder of scene clips and narration
//! by driving ffmpeg through a fixed sequence of stages per output. This
//! crate contains all business logic with zero UI dependencies; the
//! `reelsmith` CLI and any desktop shell are thin callers.

pub mod config;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod probe;
pub mod process;
pub mod snapshot;
pub mod stages;
pub mod subtitles;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
