//! SRT subtitle writer.
//!
//! SRT uses millisecond timing (`HH:MM:SS,mmm`), 1-based indices and a blank
//! line between cues.

use super::cues::SubtitleCue;

/// Write cues to SRT format string.
pub fn write_srt(cues: &[SubtitleCue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start_ms),
            format_srt_time(cue.end_ms)
        ));
        output.push_str(&cue.text);
        output.push('\n');
    }

    output
}

/// Format milliseconds as SRT timestamp (HH:MM:SS,mmm).
pub fn format_srt_time(ms: u64) -> String {
    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0), "00:00:00,000");
        assert_eq!(format_srt_time(1500), "00:00:01,500");
        assert_eq!(format_srt_time(60_000), "00:01:00,000");
        assert_eq!(format_srt_time(3_723_004), "01:02:03,004");
    }

    #[test]
    fn test_write_basic_srt() {
        let cues = vec![
            SubtitleCue {
                text: "Hello, world!".to_string(),
                start_ms: 200,
                end_ms: 4000,
            },
            SubtitleCue {
                text: "Second".to_string(),
                start_ms: 4200,
                end_ms: 8000,
            },
        ];

        let expected = "1\n00:00:00,200 --> 00:00:04,000\nHello, world!\n\n2\n00:00:04,200 --> 00:00:08,000\nSecond\n";
        assert_eq!(write_srt(&cues), expected);
    }

    #[test]
    fn empty_track_is_empty_document() {
        assert_eq!(write_srt(&[]), "");
    }
}
