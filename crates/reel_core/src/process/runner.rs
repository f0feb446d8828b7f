//! Command runner trait and the system implementation.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::invocation::Invocation;
use super::progress::{is_status_line, LineSplitter, ProgressTracker};

/// Receiver for everything a running command reports.
pub trait OutputSink: Send + Sync {
    /// The command line about to run.
    fn command(&self, command_line: &str);
    /// One diagnostic line of tool output.
    fn output_line(&self, line: &str);
    /// Progress of the named operation.
    fn progress(&self, operation: &str, percent: u32);
    /// Non-fatal problem (cleanup failures).
    fn warning(&self, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn command(&self, _command_line: &str) {}
    fn output_line(&self, _line: &str) {}
    fn progress(&self, _operation: &str, _percent: u32) {}
    fn warning(&self, _message: &str) {}
}

/// Why a command failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The process could not be started.
    Spawn(String),
    /// The process exited unsuccessfully (`None` when killed by a signal).
    Exit(Option<i32>),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Spawn(reason) => write!(f, "failed to start: {}", reason),
            FailureKind::Exit(Some(code)) => write!(f, "exited with code {}", code),
            FailureKind::Exit(None) => write!(f, "terminated by signal"),
        }
    }
}

/// Diagnostic for a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{program} {kind}")]
pub struct CommandFailure {
    /// Program name as invoked.
    pub program: String,
    /// Full command line.
    pub command_line: String,
    /// Declared inputs.
    pub inputs: Vec<PathBuf>,
    /// Declared output.
    pub output: Option<PathBuf>,
    pub kind: FailureKind,
    /// Captured error stream, status lines excluded.
    pub stderr: Vec<String>,
}

impl CommandFailure {
    /// Build a failure for an invocation.
    pub fn new(invocation: &Invocation, kind: FailureKind, stderr: Vec<String>) -> Self {
        Self {
            program: invocation
                .program
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| invocation.program.display().to_string()),
            command_line: invocation.command_line(),
            inputs: invocation.inputs.clone(),
            output: invocation.output.clone(),
            kind,
            stderr,
        }
    }

    /// Multi-line report with command, inputs and the error stream.
    pub fn diagnostic(&self) -> String {
        let mut report = format!("{} {}\ncommand: {}", self.program, self.kind, self.command_line);
        for input in &self.inputs {
            report.push_str(&format!("\ninput: {}", input.display()));
        }
        if let Some(output) = &self.output {
            report.push_str(&format!("\noutput: {}", output.display()));
        }
        if !self.stderr.is_empty() {
            report.push_str("\nstderr:");
            for line in &self.stderr {
                report.push_str("\n  ");
                report.push_str(line);
            }
        }
        report
    }
}

/// Result of running one command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Success { elapsed: Duration },
    Failure(CommandFailure),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success { .. })
    }

    /// Convert to a `Result` for `?` propagation.
    pub fn into_result(self) -> Result<Duration, CommandFailure> {
        match self {
            CommandOutcome::Success { elapsed } => Ok(elapsed),
            CommandOutcome::Failure(failure) => Err(failure),
        }
    }
}

/// A scratch file that could not be removed.
#[derive(Debug, Error)]
#[error("Failed to remove temporary file {}: {source}", .path.display())]
pub struct CleanupWarning {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Executes invocations.
///
/// Implementations never return errors for tool failures; they report them
/// as [`CommandOutcome::Failure`].
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &Invocation, sink: &dyn OutputSink) -> CommandOutcome;
}

/// Runs commands with `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation, sink: &dyn OutputSink) -> CommandOutcome {
        let command_line = invocation.command_line();
        sink.command(&command_line);
        tracing::debug!(label = %invocation.label, "Running: {}", command_line);

        let started = Instant::now();
        let spawned = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                remove_scratch(&invocation.scratch, sink);
                return CommandOutcome::Failure(CommandFailure::new(
                    invocation,
                    FailureKind::Spawn(e.to_string()),
                    Vec::new(),
                ));
            }
        };

        let mut diagnostics = Vec::new();
        let mut tracker = ProgressTracker::new(invocation.expected_secs);
        let mut handle_line = |line: String| {
            if let Some(percent) = tracker.observe(&line) {
                sink.progress(&invocation.label, percent);
            }
            if !is_status_line(&line) {
                sink.output_line(&line);
                diagnostics.push(line);
            }
        };

        if let Some(mut stderr) = child.stderr.take() {
            let mut splitter = LineSplitter::new();
            let mut buffer = [0u8; 4096];
            loop {
                match stderr.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => splitter.push(&buffer[..n]).into_iter().for_each(&mut handle_line),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::warn!("Failed reading output of {}: {}", invocation.label, e);
                        break;
                    }
                }
            }
            if let Some(rest) = splitter.finish() {
                handle_line(rest);
            }
        }

        let status = child.wait();
        remove_scratch(&invocation.scratch, sink);

        match status {
            Ok(status) if status.success() => {
                sink.progress(&invocation.label, 100);
                CommandOutcome::Success {
                    elapsed: started.elapsed(),
                }
            }
            Ok(status) => CommandOutcome::Failure(CommandFailure::new(
                invocation,
                FailureKind::Exit(status.code()),
                diagnostics,
            )),
            Err(e) => CommandOutcome::Failure(CommandFailure::new(
                invocation,
                FailureKind::Spawn(format!("wait failed: {}", e)),
                diagnostics,
            )),
        }
    }
}

/// Remove scratch files, reporting failures as warnings.
///
/// Files that are already gone are not an error.
pub fn remove_scratch(paths: &[PathBuf], sink: &dyn OutputSink) {
    for path in paths {
        if let Err(warning) = remove_file(path) {
            tracing::warn!("{}", warning);
            sink.warning(&warning.to_string());
        }
    }
}

fn remove_file(path: &Path) -> Result<(), CleanupWarning> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CleanupWarning {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<String>>,
        warnings: Mutex<Vec<String>>,
        progress: Mutex<Vec<u32>>,
    }

    impl OutputSink for RecordingSink {
        fn command(&self, _command_line: &str) {}
        fn output_line(&self, line: &str) {
            self.lines.lock().push(line.to_string());
        }
        fn progress(&self, _operation: &str, percent: u32) {
            self.progress.lock().push(percent);
        }
        fn warning(&self, message: &str) {
            self.warnings.lock().push(message.to_string());
        }
    }

    #[test]
    fn spawn_failure_is_an_outcome() {
        let dir = tempdir().unwrap();
        let scratch = dir.path().join("list.txt");
        fs::write(&scratch, "file 'a.mp4'").unwrap();

        let inv = Invocation::new(dir.path().join("no-such-tool"), "Concatenate")
            .arg("-y")
            .scratch_file(&scratch);
        let outcome = SystemRunner::new().run(&inv, &NullSink);

        match outcome {
            CommandOutcome::Failure(failure) => {
                assert!(matches!(failure.kind, FailureKind::Spawn(_)));
                assert_eq!(failure.program, "no-such-tool");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!scratch.exists());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_stderr() {
        let inv = Invocation::new("sh", "Probe")
            .arg("-c")
            .arg("echo 'Duration: 00:00:10.00, start' >&2; echo 'frame=1 time=00:00:05.00' >&2; echo boom >&2; exit 3");
        let sink = RecordingSink::default();
        let outcome = SystemRunner::new().run(&inv, &sink);

        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.kind, FailureKind::Exit(Some(3)));
        assert!(failure.stderr.iter().any(|l| l == "boom"));
        assert!(!failure.stderr.iter().any(|l| l.starts_with("frame=")));
        assert_eq!(*sink.progress.lock(), vec![50]);
        assert!(failure.diagnostic().contains("exited with code 3"));
    }

    #[cfg(unix)]
    #[test]
    fn success_reports_full_progress() {
        let inv = Invocation::new("sh", "Trim").arg("-c").arg("exit 0");
        let sink = RecordingSink::default();
        let outcome = SystemRunner::new().run(&inv, &sink);

        assert!(outcome.is_success());
        assert_eq!(*sink.progress.lock(), vec![100]);
    }

    #[test]
    fn missing_scratch_files_are_ignored() {
        let dir = tempdir().unwrap();
        let sink = RecordingSink::default();
        remove_scratch(&[dir.path().join("gone.txt")], &sink);
        assert!(sink.warnings.lock().is_empty());
    }

    #[test]
    fn unremovable_scratch_is_a_warning() {
        let dir = tempdir().unwrap();
        // A non-empty directory cannot be removed with remove_file
        let blocker = dir.path().join("blocker");
        fs::create_dir_all(blocker.join("child")).unwrap();

        let sink = RecordingSink::default();
        remove_scratch(&[blocker.clone()], &sink);

        assert!(blocker.exists());
        assert_eq!(sink.warnings.lock().len(), 1);
    }

    #[test]
    fn diagnostic_lists_context() {
        let inv = Invocation::new("/usr/bin/ffmpeg", "Mux")
            .input(Path::new("/a.mp4"))
            .output(Path::new("/b.mp4"));
        let failure = CommandFailure::new(&inv, FailureKind::Exit(Some(1)), vec!["bad".into()]);
        let report = failure.diagnostic();

        assert!(report.starts_with("ffmpeg exited with code 1"));
        assert!(report.contains("input: /a.mp4"));
        assert!(report.contains("output: /b.mp4"));
        assert!(report.contains("  bad"));
        assert_eq!(failure.to_string(), "ffmpeg exited with code 1");
    }
}
