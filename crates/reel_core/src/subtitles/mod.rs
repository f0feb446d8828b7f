//! Subtitle synthesis.
//!
//! Turns each scene's caption and narration length into a timed SRT track,
//! and builds the style overrides used when burning it in.
//!
//! # Usage
//!
//! ```
//! use reel_core::subtitles::{synthesize, CueSpec};
//!
//! let srt = synthesize(&[CueSpec::new("Hello", 2.0)]);
//! assert!(srt.starts_with("1\n00:00:00,200 --> 00:00:02,000\n"));
//! ```

mod cues;
mod srt;
mod style;

use std::fs;
use std::io;
use std::path::Path;

pub use cues::{build_cues, CueSpec, SubtitleCue, CUE_GAP_MS};
pub use srt::{format_srt_time, write_srt};
pub use style::force_style;

/// Produce the complete SRT document for the given cues.
pub fn synthesize(specs: &[CueSpec]) -> String {
    write_srt(&build_cues(specs))
}

/// Synthesize and write the track to `path`.
pub fn write_file(specs: &[CueSpec], path: &Path) -> io::Result<()> {
    fs::write(path, synthesize(specs))
}
