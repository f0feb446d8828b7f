//! Typed description of one external command.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// One external command: program, argument vector and the files it touches.
///
/// Arguments are passed straight to the process spawner, never through a
/// shell, so paths with spaces or quotes need no escaping here.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Executable to run.
    pub program: PathBuf,
    /// Argument vector.
    pub args: Vec<OsString>,
    /// Operation name used for progress events.
    pub label: String,
    /// Files the command reads.
    pub inputs: Vec<PathBuf>,
    /// File the command writes.
    pub output: Option<PathBuf>,
    /// Expected output duration in seconds (progress denominator).
    pub expected_secs: Option<f64>,
    /// Files removed once the process exits, whatever the result.
    pub scratch: Vec<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            label: label.into(),
            inputs: Vec::new(),
            output: None,
            expected_secs: None,
            scratch: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Add `-i <path>` and record the path as an input.
    pub fn input(mut self, path: &Path) -> Self {
        self.args.push(OsString::from("-i"));
        self.args.push(path.as_os_str().to_os_string());
        self.inputs.push(path.to_path_buf());
        self
    }

    /// Record an input that is referenced indirectly (e.g. from a list file).
    pub fn declares_input(mut self, path: &Path) -> Self {
        self.inputs.push(path.to_path_buf());
        self
    }

    /// Append the output path as the final positional argument.
    pub fn output(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self.output = Some(path.to_path_buf());
        self
    }

    /// Set the expected output duration.
    pub fn expected_duration(mut self, secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            self.expected_secs = Some(secs);
        }
        self
    }

    /// Register a scratch file deleted after the process exits.
    pub fn scratch_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.scratch.push(path.into());
        self
    }

    /// Human-readable command line for logs and diagnostics.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| quote_for_display(&part.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_for_display(part: &str) -> String {
    if part.is_empty() || part.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        format!("\"{}\"", part.replace('"', "\\\""))
    } else {
        part.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_records_inputs_and_output() {
        let inv = Invocation::new("ffmpeg", "Trim")
            .args(["-y", "-hide_banner"])
            .input(Path::new("/in/clip.mp4"))
            .arg("-an")
            .output(Path::new("/tmp/out.mp4"));

        assert_eq!(inv.inputs, vec![PathBuf::from("/in/clip.mp4")]);
        assert_eq!(inv.output, Some(PathBuf::from("/tmp/out.mp4")));
        assert_eq!(
            inv.args,
            ["-y", "-hide_banner", "-i", "/in/clip.mp4", "-an", "/tmp/out.mp4"]
                .iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn command_line_quotes_paths_with_spaces() {
        let inv = Invocation::new("ffmpeg", "Mux")
            .input(Path::new("/my clips/a.mp4"))
            .output(Path::new("/out/b.mp4"));
        assert_eq!(
            inv.command_line(),
            "ffmpeg -i \"/my clips/a.mp4\" /out/b.mp4"
        );
    }

    #[test]
    fn non_positive_expected_duration_is_ignored() {
        let inv = Invocation::new("ffmpeg", "x").expected_duration(0.0);
        assert!(inv.expected_secs.is_none());
        let inv = inv.expected_duration(12.5);
        assert_eq!(inv.expected_secs, Some(12.5));
    }
}
