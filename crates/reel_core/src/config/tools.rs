//! Resolution of external tool locations.

use std::env;
use std::path::{Path, PathBuf};

use super::settings::ToolSettings;

/// Resolved locations of the external programs the pipeline drives.
///
/// Built once at startup and handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// Fonts directory for subtitle rendering, if one was found.
    pub fonts_dir: Option<PathBuf>,
}

impl ToolPaths {
    /// Bare tool names, looked up on PATH.
    pub fn system() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            fonts_dir: None,
        }
    }

    /// Resolve against the working directory, then the executable's directory.
    pub fn resolve(settings: &ToolSettings) -> Self {
        let mut roots = Vec::new();
        if let Ok(cwd) = env::current_dir() {
            roots.push(cwd);
        }
        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            roots.push(exe_dir);
        }
        Self::resolve_from(settings, &roots)
    }

    /// Resolve using explicit search roots.
    ///
    /// Order per tool: configured path, `<root>/<resources_dir>/<tool>` for
    /// each root, then the bare name.
    pub fn resolve_from(settings: &ToolSettings, roots: &[PathBuf]) -> Self {
        let resources = Path::new(&settings.resources_dir);

        let ffmpeg = resolve_tool("ffmpeg", &settings.ffmpeg_path, resources, roots);
        let ffprobe = resolve_tool("ffprobe", &settings.ffprobe_path, resources, roots);

        let fonts_dir = if !settings.fonts_dir.trim().is_empty() {
            Some(PathBuf::from(settings.fonts_dir.trim()))
        } else {
            roots
                .iter()
                .map(|root| root.join(resources).join("Fonts"))
                .find(|candidate| candidate.is_dir())
        };

        tracing::debug!(
            ffmpeg = %ffmpeg.display(),
            ffprobe = %ffprobe.display(),
            fonts = ?fonts_dir,
            "Resolved tool paths"
        );

        Self {
            ffmpeg,
            ffprobe,
            fonts_dir,
        }
    }
}

fn resolve_tool(name: &str, configured: &str, resources: &Path, roots: &[PathBuf]) -> PathBuf {
    let configured = configured.trim();
    if !configured.is_empty() {
        return PathBuf::from(configured);
    }

    let file_name = executable_name(name);
    roots
        .iter()
        .map(|root| root.join(resources).join(&file_name))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}
