//! Reconciling footage length with narration length.

use serde::{Deserialize, Serialize};

/// How a scene's footage is conformed to its narration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimingDecision {
    /// Footage is shorter: slow it down by `factor` (< 1.0).
    ///
    /// Output duration is `video / factor`, which equals the narration.
    SpeedAdjust { factor: f64 },

    /// Footage is at least as long: cut a centred window.
    Trim { start_offset: f64, duration: f64 },
}

impl TimingDecision {
    /// Choose the decision for the given durations (seconds).
    pub fn decide(video_duration: f64, audio_duration: f64) -> Self {
        if video_duration < audio_duration {
            TimingDecision::SpeedAdjust {
                factor: video_duration / audio_duration,
            }
        } else {
            TimingDecision::Trim {
                start_offset: (video_duration - audio_duration) / 2.0,
                duration: audio_duration,
            }
        }
    }

    /// Operation name used in logs and progress events.
    pub fn operation(&self) -> &'static str {
        match self {
            TimingDecision::SpeedAdjust { .. } => "Speed adjust",
            TimingDecision::Trim { .. } => "Trim",
        }
    }

    /// Duration of the conformed clip for a source of `video_duration`.
    pub fn output_duration(&self, video_duration: f64) -> f64 {
        match self {
            TimingDecision::SpeedAdjust { factor } => video_duration / factor,
            TimingDecision::Trim { duration, .. } => *duration,
        }
    }
}
