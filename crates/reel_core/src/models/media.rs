//! Scene and asset structures.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::timing::TimingDecision;

/// Role of a file inside a product directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Narration inside a scene folder.
    Audio,
    /// Backdrop footage inside a scene folder.
    Video,
    /// Overlay image at the product root.
    Watermark,
    /// Background music at the product root.
    Music,
}

impl AssetKind {
    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::Video => "video",
            AssetKind::Watermark => "watermark",
            AssetKind::Music => "background music",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scene folder with the assets picked for one output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Folder name ("A", "B", ...).
    pub name: String,
    /// Narration asset.
    pub audio: PathBuf,
    /// Backdrop asset.
    pub video: PathBuf,
}

impl Scene {
    pub fn new(name: impl Into<String>, audio: impl Into<PathBuf>, video: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            audio: audio.into(),
            video: video.into(),
        }
    }

    /// Subtitle text for this scene: the narration file name without extension.
    pub fn caption(&self) -> String {
        file_stem(&self.audio)
    }
}

/// A scene after its clip was conformed to the narration and muxed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedScene {
    pub scene: Scene,
    pub audio_duration: f64,
    pub video_duration: f64,
    pub decision: TimingDecision,
    /// Muxed clip in the workspace.
    pub clip: PathBuf,
}

impl ProcessedScene {
    pub fn caption(&self) -> String {
        self.scene.caption()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
