//! Subtitle cue timing.

use serde::{Deserialize, Serialize};

/// Gap between consecutive cues, in milliseconds.
pub const CUE_GAP_MS: u64 = 200;

/// Input to the synthesizer: one scene's caption and narration length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueSpec {
    pub text: String,
    /// Narration duration in seconds.
    pub duration: f64,
}

impl CueSpec {
    pub fn new(text: impl Into<String>, duration: f64) -> Self {
        Self {
            text: text.into(),
            duration,
        }
    }
}

/// A timed subtitle cue. Times are whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Lay cues out back to back.
///
/// Each cue starts [`CUE_GAP_MS`] after the previous one ends (the first at
/// the gap itself) and ends one gap before its narration does. Durations
/// shorter than the gap produce zero-length cues.
pub fn build_cues(specs: &[CueSpec]) -> Vec<SubtitleCue> {
    let mut cursor = 0u64;
    specs
        .iter()
        .map(|spec| {
            let duration_ms = secs_to_ms(spec.duration);
            let start_ms = cursor + CUE_GAP_MS;
            let end_ms = (start_ms + duration_ms).saturating_sub(CUE_GAP_MS).max(start_ms);
            cursor = end_ms;
            SubtitleCue {
                text: spec.text.clone(),
                start_ms,
                end_ms,
            }
        })
        .collect()
}

fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cue_starts_after_gap() {
        let cues = build_cues(&[CueSpec::new("hello", 3.0)]);
        assert_eq!(cues[0].start_ms, 200);
        assert_eq!(cues[0].end_ms, 3000);
    }

    #[test]
    fn cues_follow_each_other_by_the_gap() {
        let cues = build_cues(&[
            CueSpec::new("one", 2.5),
            CueSpec::new("two", 4.0),
            CueSpec::new("three", 1.25),
        ]);

        for pair in cues.windows(2) {
            assert_eq!(pair[1].start_ms, pair[0].end_ms + CUE_GAP_MS);
            assert!(pair[0].start_ms <= pair[0].end_ms);
        }
        assert_eq!(
            cues.iter().map(|c| (c.start_ms, c.end_ms)).collect::<Vec<_>>(),
            vec![(200, 2500), (2700, 6500), (6700, 7750)]
        );
    }

    #[test]
    fn short_duration_is_clamped_to_zero_length() {
        let cues = build_cues(&[CueSpec::new("blip", 0.1), CueSpec::new("next", 1.0)]);
        assert_eq!(cues[0].start_ms, cues[0].end_ms);
        assert_eq!(cues[1].start_ms, cues[0].end_ms + CUE_GAP_MS);
    }

    #[test]
    fn empty_input_gives_no_cues() {
        assert!(build_cues(&[]).is_empty());
    }
}
