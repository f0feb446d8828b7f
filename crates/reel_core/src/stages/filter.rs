//! Escaping for ffmpeg filter arguments and concat lists.

use std::path::Path;

/// Escape a value for use inside a filtergraph option.
///
/// Two levels apply: the option parser (`\`, `'`, `:`) and the filtergraph
/// parser (`\`, `'`, `[`, `]`, `,`, `;`).
pub fn escape_filter_value(value: &str) -> String {
    let mut option_level = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(c);
    }

    let mut graph_level = String::with_capacity(option_level.len());
    for c in option_level.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            graph_level.push('\\');
        }
        graph_level.push(c);
    }
    graph_level
}

/// Build the `subtitles` filter for burning an SRT track.
pub fn subtitles_filter(
    srt: &Path,
    fonts_dir: Option<&Path>,
    original_size: (u32, u32),
    force_style: &str,
) -> String {
    let mut filter = format!(
        "subtitles=filename={}",
        escape_filter_value(&srt.to_string_lossy())
    );
    if let Some(dir) = fonts_dir {
        filter.push_str(&format!(
            ":fontsdir={}",
            escape_filter_value(&dir.to_string_lossy())
        ));
    }
    filter.push_str(&format!(
        ":original_size={}x{}:force_style={}",
        original_size.0,
        original_size.1,
        escape_filter_value(force_style)
    ));
    filter
}

/// Contents of a concat demuxer list, one `file '<path>'` line per clip.
pub fn concat_list(clips: &[impl AsRef<Path>]) -> String {
    clips
        .iter()
        .map(|clip| {
            let path = clip.as_ref().to_string_lossy().replace('\\', "/");
            format!("file '{}'\n", path.replace('\'', "'\\''"))
        })
        .collect()
}
