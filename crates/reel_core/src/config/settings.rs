//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Uniform encoding applied to processed scene clips.
    #[serde(default)]
    pub encoding: EncodingSettings,

    /// Burned-in subtitle style.
    #[serde(default)]
    pub subtitle: SubtitleSettings,

    /// Product directory layout and mix parameters.
    #[serde(default)]
    pub composition: CompositionSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Locations of ffmpeg, ffprobe and the subtitle fonts.
///
/// Empty strings mean "resolve automatically".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Explicit ffmpeg executable.
    #[serde(default)]
    pub ffmpeg_path: String,

    /// Explicit ffprobe executable.
    #[serde(default)]
    pub ffprobe_path: String,

    /// Explicit fonts directory for subtitle rendering.
    #[serde(default)]
    pub fonts_dir: String,

    /// Bundled resources directory searched before PATH.
    #[serde(default = "default_resources_dir")]
    pub resources_dir: String,
}

fn default_resources_dir() -> String {
    "resources".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: String::new(),
            ffprobe_path: String::new(),
            fonts_dir: String::new(),
            resources_dir: default_resources_dir(),
        }
    }
}

/// Encoding parameters for speed-adjusted and trimmed clips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant rate factor (lower is higher quality).
    #[serde(default = "default_crf")]
    pub crf: u32,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_width() -> u32 {
    720
}

fn default_height() -> u32 {
    1280
}

fn default_frame_rate() -> u32 {
    30
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_crf() -> u32 {
    23
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            frame_rate: default_frame_rate(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

/// ASS style overrides passed to the subtitles filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleSettings {
    #[serde(default = "default_play_res_x")]
    pub play_res_x: u32,

    #[serde(default = "default_play_res_y")]
    pub play_res_y: u32,

    #[serde(default = "default_font_name")]
    pub font_name: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Text colour in ASS `&HBBGGRR` notation.
    #[serde(default = "default_primary_colour")]
    pub primary_colour: String,

    #[serde(default = "default_outline")]
    pub outline: u32,

    #[serde(default = "default_outline_colour")]
    pub outline_colour: String,

    /// Numpad-style alignment (2 = bottom centre).
    #[serde(default = "default_alignment")]
    pub alignment: u32,

    #[serde(default = "default_margin_h")]
    pub margin_l: u32,

    #[serde(default = "default_margin_h")]
    pub margin_r: u32,

    #[serde(default = "default_margin_v")]
    pub margin_v: u32,
}

fn default_play_res_x() -> u32 {
    1080
}

fn default_play_res_y() -> u32 {
    1920
}

fn default_font_name() -> String {
    "SourceHanSansCN-Bold".to_string()
}

fn default_font_size() -> u32 {
    55
}

fn default_primary_colour() -> String {
    "&HFFFFFF".to_string()
}

fn default_outline() -> u32 {
    3
}

fn default_outline_colour() -> String {
    "&H4100FF".to_string()
}

fn default_alignment() -> u32 {
    2
}

fn default_margin_h() -> u32 {
    20
}

fn default_margin_v() -> u32 {
    300
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            play_res_x: default_play_res_x(),
            play_res_y: default_play_res_y(),
            font_name: default_font_name(),
            font_size: default_font_size(),
            primary_colour: default_primary_colour(),
            outline: default_outline(),
            outline_colour: default_outline_colour(),
            alignment: default_alignment(),
            margin_l: default_margin_h(),
            margin_r: default_margin_h(),
            margin_v: default_margin_v(),
        }
    }
}

/// Product directory layout and final-mix parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionSettings {
    /// Output subfolder inside the product directory.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Narration extensions inside scene folders.
    #[serde(default = "default_mp3")]
    pub audio_extensions: Vec<String>,

    /// Backdrop extensions inside scene folders.
    #[serde(default = "default_mp4")]
    pub video_extensions: Vec<String>,

    /// Watermark image extensions at the product root.
    #[serde(default = "default_png")]
    pub watermark_extensions: Vec<String>,

    /// Background music extensions at the product root.
    #[serde(default = "default_mp3")]
    pub music_extensions: Vec<String>,

    /// Overlay position expression.
    #[serde(default = "default_watermark_position")]
    pub watermark_position: String,

    /// Background music volume relative to the narration.
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,
}

fn default_output_folder() -> String {
    "成品".to_string()
}

fn default_mp3() -> Vec<String> {
    vec!["mp3".to_string()]
}

fn default_mp4() -> Vec<String> {
    vec!["mp4".to_string()]
}

fn default_png() -> Vec<String> {
    vec!["png".to_string()]
}

fn default_watermark_position() -> String {
    "W-w-10:H-h-10".to_string()
}

fn default_music_volume() -> f64 {
    0.15
}

impl Default for CompositionSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            audio_extensions: default_mp3(),
            video_extensions: default_mp4(),
            watermark_extensions: default_png(),
            music_extensions: default_mp3(),
            watermark_position: default_watermark_position(),
            music_volume: default_music_volume(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for batch log output.
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Number of tool output lines to replay on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Folder for batch log files. Empty disables them.
    #[serde(default)]
    pub log_dir: String,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: default_progress_step(),
            error_tail: default_error_tail(),
            log_dir: String::new(),
        }
    }
}

impl LoggingSettings {
    /// Build the runtime logger configuration.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            progress_step: self.progress_step,
            error_tail: self.error_tail as usize,
            show_timestamps: true,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Tools,
    Encoding,
    Subtitle,
    Composition,
    Logging,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Tools,
        ConfigSection::Encoding,
        ConfigSection::Subtitle,
        ConfigSection::Composition,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "tools",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Subtitle => "subtitle",
            ConfigSection::Composition => "composition",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section in a generated file.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "External tool locations (empty = auto-detect)",
            ConfigSection::Encoding => "Encoding of processed scene clips",
            ConfigSection::Subtitle => "Burned-in subtitle style",
            ConfigSection::Composition => "Product layout and final mix",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}
