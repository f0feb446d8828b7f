//! Per-batch logger with file, tracing and event output.
//!
//! Each batch gets its own logger that:
//! - Writes to a dedicated log file (when a log directory is configured)
//! - Mirrors messages to `tracing`
//! - Publishes log and progress events to subscribers
//! - Maintains a tail buffer of external tool output for error diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogConfig, LogLevel, MessagePrefix};
use crate::events::{EventHub, PipelineEvent, Severity};
use crate::process::OutputSink;

/// Per-batch logger with triple output (file, tracing, events).
pub struct RunLogger {
    /// Batch name for identification.
    name: String,
    /// Path to log file, if one was opened.
    log_path: Option<PathBuf>,
    /// File writer (buffered).
    file_writer: Mutex<Option<BufWriter<File>>>,
    /// Event hub receiving log and progress events.
    hub: EventHub,
    /// Logging configuration.
    config: LogConfig,
    /// Tail buffer for recent tool output lines.
    tail_buffer: Mutex<VecDeque<String>>,
    /// Last progress logged, per operation (for compact mode filtering).
    last_progress: Mutex<Option<(String, u32)>>,
}

impl RunLogger {
    /// Create a new batch logger.
    ///
    /// # Arguments
    /// * `name` - Name of the batch (used in the log filename)
    /// * `log_dir` - Directory for the log file; `None` disables file output
    /// * `config` - Logging configuration
    /// * `hub` - Event hub that receives log and progress events
    pub fn new(
        name: impl Into<String>,
        log_dir: Option<&Path>,
        config: LogConfig,
        hub: EventHub,
    ) -> std::io::Result<Self> {
        let name = name.into();

        let (log_path, file_writer) = match log_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let stamp = Local::now().format("%Y%m%d_%H%M%S");
                let path = dir.join(format!("{}_{}.log", sanitize_filename(&name), stamp));
                let file = File::create(&path)?;
                (Some(path), Some(BufWriter::new(file)))
            }
            None => (None, None),
        };

        Ok(Self {
            name,
            log_path,
            file_writer: Mutex::new(file_writer),
            hub,
            config,
            tail_buffer: Mutex::new(VecDeque::with_capacity(100)),
            last_progress: Mutex::new(None),
        })
    }

    /// Logger without a file, publishing to the given hub.
    pub fn detached(name: impl Into<String>, config: LogConfig, hub: EventHub) -> Self {
        Self {
            name: name.into(),
            log_path: None,
            file_writer: Mutex::new(None),
            hub,
            config,
            tail_buffer: Mutex::new(VecDeque::with_capacity(100)),
            last_progress: Mutex::new(None),
        }
    }

    /// Get the batch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the log file path.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, severity: Severity, message: &str) {
        if level < self.config.level {
            return;
        }

        match level {
            LogLevel::Trace => tracing::trace!(batch = %self.name, "{}", message),
            LogLevel::Debug => tracing::debug!(batch = %self.name, "{}", message),
            LogLevel::Info => tracing::info!(batch = %self.name, "{}", message),
            LogLevel::Warn => tracing::warn!(batch = %self.name, "{}", message),
            LogLevel::Error => tracing::error!(batch = %self.name, "{}", message),
        }

        self.write_file(&self.format_message(message));
        self.hub.publish(PipelineEvent::log(message, severity));
    }

    /// Log an info message.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, Severity::Info, message);
    }

    /// Log a debug message.
    pub fn debug(&self, message: &str) {
        let msg = MessagePrefix::Debug.format(message);
        self.log(LogLevel::Debug, Severity::Debug, &msg);
    }

    /// Log a warning message.
    pub fn warn(&self, message: &str) {
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, Severity::Warning, &msg);
    }

    /// Log an error message.
    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, Severity::Error, &msg);
    }

    /// Log a success message.
    pub fn success(&self, message: &str) {
        let msg = MessagePrefix::Success.format(message);
        self.log(LogLevel::Info, Severity::Success, &msg);
    }

    /// Log a command being executed.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Debug, Severity::Debug, &msg);
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Info, Severity::Info, &msg);
    }

    /// Log a section marker.
    pub fn section(&self, section_name: &str) {
        let msg = MessagePrefix::Section.format(section_name);
        self.log(LogLevel::Info, Severity::Info, &msg);
    }

    /// Publish a progress tick (filtered in compact mode).
    ///
    /// Returns true if the tick was published, false if filtered.
    pub fn progress(&self, operation: &str, percent: u32) -> bool {
        let percent = percent.min(100);

        if self.config.compact {
            let mut last = self.last_progress.lock();
            let step = self.config.progress_step.max(1);

            if let Some((last_op, last_percent)) = last.as_ref() {
                if last_op == operation {
                    let current_step = (percent / step) * step;
                    let last_step = (*last_percent / step) * step;
                    if current_step <= last_step && percent < 100 {
                        return false;
                    }
                }
            }
            *last = Some((operation.to_string(), percent));
        } else {
            self.write_file(&self.format_message(&format!("{}: {}%", operation, percent)));
        }

        self.hub.publish(PipelineEvent::progress(operation, percent));
        true
    }

    /// Record an output line from an external tool.
    ///
    /// Lines always go to the tail buffer. Outside compact mode they are
    /// also logged at debug level.
    pub fn output_line(&self, line: &str) {
        {
            let mut buffer = self.tail_buffer.lock();
            if buffer.len() >= self.config.error_tail.max(1) {
                buffer.pop_front();
            }
            buffer.push_back(line.to_string());
        }

        if !self.config.compact {
            self.log(LogLevel::Debug, Severity::Debug, line);
        }
    }

    /// Replay the tail buffer (typically after an error).
    pub fn show_tail(&self, header: &str) {
        let lines = self.get_tail();
        if lines.is_empty() {
            return;
        }

        self.log(LogLevel::Error, Severity::Error, &format!("[{}/tail]", header));
        for line in &lines {
            self.log(LogLevel::Error, Severity::Error, line);
        }
    }

    /// Clear the tail buffer.
    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    /// Get the current tail buffer contents.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Publish an event that is not a log line (state changes).
    pub fn publish(&self, event: PipelineEvent) {
        self.hub.publish(event);
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Close the logger and release the file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    /// Format a message with timestamp (if enabled).
    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn write_file(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
    }
}

impl OutputSink for RunLogger {
    fn command(&self, command_line: &str) {
        RunLogger::command(self, command_line);
    }

    fn output_line(&self, line: &str) {
        RunLogger::output_line(self, line);
    }

    fn progress(&self, operation: &str, percent: u32) {
        RunLogger::progress(self, operation, percent);
    }

    fn warning(&self, message: &str) {
        self.warn(message);
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sanitize a string to be safe for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn drain(rx: &std::sync::mpsc::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn creates_log_file_in_dir() {
        let dir = tempdir().unwrap();
        let logger =
            RunLogger::new("batch", Some(dir.path()), LogConfig::default(), EventHub::new())
                .unwrap();

        let path = logger.log_path().unwrap();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("batch_"));
    }

    #[test]
    fn writes_to_file() {
        let dir = tempdir().unwrap();
        let logger =
            RunLogger::new("batch", Some(dir.path()), LogConfig::default(), EventHub::new())
                .unwrap();

        logger.info("Test message");
        logger.flush();

        let content = fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(content.contains("Test message"));
    }

    #[test]
    fn publishes_log_events_with_severity() {
        let hub = EventHub::new();
        let rx = hub.subscribe();
        let logger = RunLogger::detached("batch", LogConfig::default(), hub);

        logger.success("done");
        logger.warn("careful");

        let events = drain(&rx);
        assert_eq!(
            events,
            vec![
                PipelineEvent::log("[SUCCESS] done", Severity::Success),
                PipelineEvent::log("[WARNING] careful", Severity::Warning),
            ]
        );
    }

    #[test]
    fn level_filter_drops_debug() {
        let hub = EventHub::new();
        let rx = hub.subscribe();
        let logger = RunLogger::detached("batch", LogConfig::default(), hub);

        logger.debug("hidden");
        logger.command("ffmpeg -y");

        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn compact_mode_filters_progress() {
        let mut config = LogConfig::default();
        config.compact = true;
        config.progress_step = 20;
        let logger = RunLogger::detached("batch", config, EventHub::new());

        assert!(logger.progress("Trim", 0));
        assert!(!logger.progress("Trim", 5));
        assert!(!logger.progress("Trim", 15));
        assert!(logger.progress("Trim", 20));
        assert!(!logger.progress("Trim", 25));
        assert!(logger.progress("Trim", 40));
        assert!(logger.progress("Trim", 100));

        // A new operation starts its own sequence
        assert!(logger.progress("Mux", 5));
    }

    #[test]
    fn tail_buffer_maintains_limit() {
        let mut config = LogConfig::default();
        config.error_tail = 5;
        let logger = RunLogger::detached("batch", config, EventHub::new());

        for i in 0..10 {
            logger.output_line(&format!("Line {}", i));
        }

        let tail = logger.get_tail();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], "Line 5");
        assert_eq!(tail[4], "Line 9");
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
