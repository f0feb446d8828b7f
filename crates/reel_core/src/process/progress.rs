//! Parsing of ffmpeg's error stream into lines and progress.

/// Splits a byte stream into lines on both `\r` and `\n`.
///
/// ffmpeg redraws its status line with carriage returns, so splitting on
/// newlines alone would merge hundreds of updates into one line.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every complete, non-blank line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\r' || byte == b'\n' {
                self.take_line(&mut lines);
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Return the trailing partial line, if any.
    pub fn finish(&mut self) -> Option<String> {
        let mut lines = Vec::new();
        self.take_line(&mut lines);
        lines.pop()
    }

    fn take_line(&mut self, lines: &mut Vec<String>) {
        if self.pending.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.pending).trim_end().to_string();
        self.pending.clear();
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
}

/// Parse `HH:MM:SS(.frac)` into seconds.
///
/// A leading minus (ffmpeg reports `-00:00:00.02` before the first frame)
/// parses as zero.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let value = value.trim();
    let (negative, value) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let mut parts = value.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    if !total.is_finite() {
        return None;
    }
    Some(if negative { 0.0 } else { total })
}

/// Whether a line is one of ffmpeg's periodic status updates.
pub fn is_status_line(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("frame=") || line.starts_with("size=")
}

/// Tracks total duration and current position to produce percentages.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    total: Option<f64>,
    fixed_total: bool,
    last_percent: Option<u32>,
}

impl ProgressTracker {
    /// Create a tracker. An expected duration overrides any `Duration:` line.
    pub fn new(expected_secs: Option<f64>) -> Self {
        let total = expected_secs.filter(|s| s.is_finite() && *s > 0.0);
        Self {
            total,
            fixed_total: total.is_some(),
            last_percent: None,
        }
    }

    /// Inspect one line; returns a new percentage when it changed.
    pub fn observe(&mut self, line: &str) -> Option<u32> {
        if !self.fixed_total && self.total.is_none() {
            if let Some(duration) = extract_field(line, "Duration:", &[',']) {
                self.total = parse_timestamp(duration).filter(|d| *d > 0.0);
                return None;
            }
        }

        let position = extract_field(line, "time=", &[' ', '\t']).and_then(parse_timestamp)?;
        let total = self.total?;

        let percent = ((position / total) * 100.0).clamp(0.0, 100.0) as u32;
        if self.last_percent == Some(percent) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }

    /// Total duration, once known.
    pub fn total(&self) -> Option<f64> {
        self.total
    }
}

fn extract_field<'a>(line: &'a str, key: &str, terminators: &[char]) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start();
    let end = rest.find(terminators).unwrap_or(rest.len());
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_carriage_returns_and_newlines() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"first\nframe=1 time=00:00:01.00\rframe=2 time=00:00:02.00\r\npart");
        assert_eq!(
            lines,
            vec![
                "first",
                "frame=1 time=00:00:01.00",
                "frame=2 time=00:00:02.00"
            ]
        );

        let more = splitter.push(b"ial\n");
        assert_eq!(more, vec!["partial"]);
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn finish_returns_trailing_line() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"no newline").is_empty());
        assert_eq!(splitter.finish().as_deref(), Some("no newline"));
    }

    #[test]
    fn parses_timestamps() {
        assert_eq!(parse_timestamp("00:00:12.50"), Some(12.5));
        assert_eq!(parse_timestamp("01:02:03"), Some(3723.0));
        assert_eq!(parse_timestamp("-00:00:00.02"), Some(0.0));
        assert_eq!(parse_timestamp("N/A"), None);
        assert_eq!(parse_timestamp("12.5"), None);
    }

    #[test]
    fn tracks_percent_from_stream_duration() {
        let mut tracker = ProgressTracker::new(None);
        assert_eq!(
            tracker.observe("  Duration: 00:00:10.00, start: 0.000000, bitrate: 1200 kb/s"),
            None
        );
        assert_eq!(tracker.total(), Some(10.0));
        assert_eq!(
            tracker.observe("frame=  75 fps=0.0 q=28.0 size=256kB time=00:00:02.50 bitrate=838.8kbits/s"),
            Some(25)
        );
        // Same percentage is not repeated
        assert_eq!(tracker.observe("frame=  76 time=00:00:02.55 bitrate=1"), None);
        assert_eq!(tracker.observe("frame=999 time=00:00:30.00 bitrate=1"), Some(100));
    }

    #[test]
    fn expected_duration_overrides_stream() {
        let mut tracker = ProgressTracker::new(Some(4.0));
        tracker.observe("  Duration: 00:01:00.00, start: 0.0");
        assert_eq!(tracker.total(), Some(4.0));
        assert_eq!(tracker.observe("size=1kB time=00:00:01.00 bitrate=1"), Some(25));
    }

    #[test]
    fn no_percent_without_total() {
        let mut tracker = ProgressTracker::new(None);
        assert_eq!(tracker.observe("  Duration: N/A, bitrate: N/A"), None);
        assert_eq!(tracker.observe("frame=1 time=00:00:01.00"), None);
    }

    #[test]
    fn recognizes_status_lines() {
        assert!(is_status_line("frame=  10 fps=0.0"));
        assert!(is_status_line("size=     256kB time=00:00:01.00"));
        assert!(!is_status_line("[libx264 @ 0x1] using cpu capabilities"));
    }
}
