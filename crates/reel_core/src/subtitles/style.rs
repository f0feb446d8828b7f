//! Burn-in style overrides for the subtitles filter.

use crate::config::SubtitleSettings;

/// Build the `force_style` value (comma-separated `Key=Value` pairs).
pub fn force_style(style: &SubtitleSettings) -> String {
    [
        ("PlayResX", style.play_res_x.to_string()),
        ("PlayResY", style.play_res_y.to_string()),
        ("Fontname", style.font_name.clone()),
        ("Fontsize", style.font_size.to_string()),
        ("PrimaryColour", style.primary_colour.clone()),
        ("Outline", style.outline.to_string()),
        ("OutlineColour", style.outline_colour.clone()),
        ("Alignment", style.alignment.to_string()),
        ("MarginL", style.margin_l.to_string()),
        ("MarginR", style.margin_r.to_string()),
        ("MarginV", style.margin_v.to_string()),
    ]
    .iter()
    .map(|(key, value)| format!("{}={}", key, value))
    .collect::<Vec<_>>()
    .join(",")
}
