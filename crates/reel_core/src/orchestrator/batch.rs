//! Batch processing: N outputs for one product directory.
//!
//! `BatchProcessor` runs outputs strictly one after another, isolating
//! failures so one bad output never stops the batch. `BatchController`
//! owns the `Idle → Running → Completed | Cancelled` state machine and runs
//! each batch on its own worker thread.

use std::panic::{self, AssertUnwindSafe};
use std::path::{self, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::{Settings, ToolPaths};
use crate::events::{EventHub, PipelineEvent, Severity};
use crate::logging::{LogConfig, MessagePrefix, RunLogger};
use crate::probe::{FfprobeProbe, MediaProbe};
use crate::process::{CommandRunner, SystemRunner};
use crate::stages::StageExecutor;

use super::create_standard_pipeline;
use super::errors::{BatchError, OutputError, OutputResult, StepError};
use super::pipeline::Pipeline;
use super::selection::{AssetSelector, RandomSelector};
use super::types::{Context, RunState};
use super::workspace::TempWorkspace;

/// What to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    /// Folder holding the scene folders.
    pub product_dir: PathBuf,
    /// Number of outputs to generate.
    pub count: usize,
}

impl BatchRequest {
    pub fn new(product_dir: impl Into<PathBuf>, count: usize) -> Self {
        Self {
            product_dir: product_dir.into(),
            count,
        }
    }

    /// Check the request can be started.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.count == 0 {
            return Err(BatchError::invalid_request("count must be at least 1"));
        }
        if !self.product_dir.is_dir() {
            return Err(BatchError::invalid_request(format!(
                "product directory not found: {}",
                self.product_dir.display()
            )));
        }
        Ok(())
    }

    /// Product name: the directory's final component.
    pub fn product_name(&self) -> String {
        match path::absolute(&self.product_dir) {
            Ok(dir) => product_name(&dir),
            Err(_) => product_name(&self.product_dir),
        }
    }
}

fn product_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// An output that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedOutput {
    /// 1-based output index.
    pub index: usize,
    /// Error text.
    pub error: String,
}

/// Result of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Outputs requested.
    pub requested: usize,
    /// Finished files, in generation order.
    pub produced: Vec<PathBuf>,
    /// Outputs that failed.
    pub failed: Vec<FailedOutput>,
    /// Whether a stop request ended the batch early.
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    /// Every attempted output failed.
    pub fn all_failed(&self) -> bool {
        self.produced.is_empty() && !self.failed.is_empty()
    }

    /// Outputs never started because of a stop request.
    pub fn not_started(&self) -> usize {
        self.requested
            .saturating_sub(self.produced.len() + self.failed.len())
    }
}

/// Batch lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Handle for requesting a stop between outputs.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop.
    ///
    /// The batch stops before the next output starts.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Runs batches synchronously on the calling thread.
pub struct BatchProcessor {
    settings: Settings,
    stages: Arc<StageExecutor>,
    probe: Arc<dyn MediaProbe>,
    selector: Arc<dyn AssetSelector>,
    pipeline: Pipeline,
}

impl BatchProcessor {
    /// Create a processor over explicit services.
    pub fn new(
        settings: Settings,
        tools: &ToolPaths,
        runner: Arc<dyn CommandRunner>,
        probe: Arc<dyn MediaProbe>,
        selector: Arc<dyn AssetSelector>,
    ) -> Self {
        let stages = StageExecutor::new(
            runner,
            tools,
            settings.encoding.clone(),
            settings.subtitle.clone(),
        );
        Self {
            settings,
            stages: Arc::new(stages),
            probe,
            selector,
            pipeline: create_standard_pipeline(),
        }
    }

    /// Processor running the real ffmpeg/ffprobe with random asset picks.
    pub fn system(settings: Settings, tools: &ToolPaths) -> Self {
        let probe = Arc::new(FfprobeProbe::new(tools.ffprobe.clone()));
        Self::new(
            settings,
            tools,
            Arc::new(SystemRunner::new()),
            probe,
            Arc::new(RandomSelector::new()),
        )
    }

    /// Replace the asset selector (e.g. a seeded one).
    pub fn with_selector(mut self, selector: Arc<dyn AssetSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generate one output. The working directory is removed on return.
    pub fn process_output(
        &self,
        request: &BatchRequest,
        index: usize,
        logger: &Arc<RunLogger>,
    ) -> OutputResult<PathBuf> {
        // Clip paths end up in the concat list, which ffmpeg resolves
        // relative to the list file rather than the working directory.
        let product_dir = path::absolute(&request.product_dir).map_err(|e| {
            OutputError::setup_failed(index, format!("resolving product directory: {}", e))
        })?;
        let workspace = TempWorkspace::create(&product_dir, index)
            .map_err(|e| OutputError::setup_failed(index, format!("creating workspace: {}", e)))?
            .with_logger(Arc::clone(logger));

        let composition = self.settings.composition.clone();
        let ctx = Context {
            product_name: product_name(&product_dir),
            output_index: index,
            output_count: request.count,
            work_dir: workspace.path().to_path_buf(),
            output_dir: product_dir.join(&composition.output_folder),
            product_dir,
            composition,
            stages: Arc::clone(&self.stages),
            probe: Arc::clone(&self.probe),
            selector: Arc::clone(&self.selector),
            logger: Arc::clone(logger),
        };

        let mut state = RunState::default();
        let run = self.pipeline.run(&ctx, &mut state)?;
        logger.debug(&format!(
            "Output {}: {} step(s) ran, {} skipped",
            index,
            run.total_steps(),
            run.steps_skipped.len()
        ));

        state.final_output.ok_or_else(|| {
            OutputError::step_failed(
                index,
                "Finalize",
                StepError::invalid_output("No output file recorded"),
            )
        })
    }

    /// Generate all outputs of `request` in order.
    ///
    /// Output failures are logged and recorded; the loop continues. The
    /// cancel flag is only checked before each output starts.
    pub fn run_batch(
        &self,
        request: &BatchRequest,
        logger: &Arc<RunLogger>,
        cancel: &CancelHandle,
    ) -> BatchSummary {
        let count = request.count;
        let mut summary = BatchSummary::new(count);

        logger.phase(&format!(
            "Generating {} video(s) for {}",
            count,
            request.product_name()
        ));

        for index in 1..=count {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                logger.warn(&format!(
                    "Stopped by request, {} output(s) not started",
                    count - index + 1
                ));
                break;
            }

            logger.section(&format!("Output {}/{}", index, count));
            match self.process_output(request, index, logger) {
                Ok(path) => {
                    logger.success(&format!("Output {} done: {}", index, path.display()));
                    summary.produced.push(path);
                }
                Err(e) => {
                    logger.error(&e.to_string());
                    let diagnostic = e.diagnostic();
                    if diagnostic != e.to_string() {
                        logger.debug(&diagnostic);
                    }
                    logger.show_tail(&format!("output {}", index));
                    summary.failed.push(FailedOutput {
                        index,
                        error: e.to_string(),
                    });
                }
            }
            logger.clear_tail();
        }

        let closing = format!(
            "Batch finished: {} produced, {} failed",
            summary.produced.len(),
            summary.failed.len()
        );
        if summary.failed.is_empty() {
            logger.success(&closing);
        } else {
            logger.warn(&closing);
        }
        logger.flush();
        summary
    }
}

/// Handle to a running batch.
#[derive(Debug)]
pub struct BatchHandle {
    worker: JoinHandle<BatchSummary>,
    cancel: CancelHandle,
}

impl BatchHandle {
    /// Block until the batch finishes.
    pub fn wait(self) -> Result<BatchSummary, BatchError> {
        self.worker.join().map_err(|_| BatchError::WorkerPanicked)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }
}

/// Start/stop surface with an event stream.
///
/// At most one batch runs per controller; a second `start` while one is
/// running is rejected with [`BatchError::Busy`].
pub struct BatchController {
    processor: Arc<BatchProcessor>,
    hub: EventHub,
    log_config: LogConfig,
    log_dir: Option<PathBuf>,
    control: Arc<Mutex<Control>>,
}

/// Lifecycle state and the running batch's cancel handle, under one lock.
#[derive(Debug, Default)]
struct Control {
    state: BatchState,
    cancel: Option<CancelHandle>,
}

impl BatchController {
    pub fn new(processor: BatchProcessor) -> Self {
        let log_config = processor.settings().logging.to_log_config();
        Self {
            processor: Arc::new(processor),
            hub: EventHub::new(),
            log_config,
            log_dir: None,
            control: Arc::new(Mutex::new(Control::default())),
        }
    }

    /// Also write each batch's log to a file in `dir`.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Override the batch logger configuration.
    pub fn with_log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> Receiver<PipelineEvent> {
        self.hub.subscribe()
    }

    pub fn state(&self) -> BatchState {
        self.control.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == BatchState::Running
    }

    /// Start a batch on a worker thread.
    pub fn start(&self, request: BatchRequest) -> Result<BatchHandle, BatchError> {
        let cancel = {
            let mut control = self.control.lock();
            if control.state == BatchState::Running {
                tracing::warn!("Start rejected: a batch is already running");
                self.hub.publish(PipelineEvent::log(
                    MessagePrefix::Warning.format("A batch is already running, start ignored"),
                    Severity::Warning,
                ));
                return Err(BatchError::Busy);
            }
            request.validate()?;
            let cancel = CancelHandle::new();
            control.state = BatchState::Running;
            control.cancel = Some(cancel.clone());
            cancel
        };

        let logger = Arc::new(self.batch_logger(&request));
        self.hub.publish(PipelineEvent::State {
            is_processing: true,
        });

        let processor = Arc::clone(&self.processor);
        let control = Arc::clone(&self.control);
        let worker_cancel = cancel.clone();
        let worker = thread::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                processor.run_batch(&request, &logger, &worker_cancel)
            }));

            {
                let mut control = control.lock();
                control.state = match &outcome {
                    Ok(summary) if summary.cancelled => BatchState::Cancelled,
                    _ => BatchState::Completed,
                };
                control.cancel = None;
            }
            logger.close();
            logger.publish(PipelineEvent::State {
                is_processing: false,
            });

            match outcome {
                Ok(summary) => summary,
                Err(payload) => panic::resume_unwind(payload),
            }
        });

        Ok(BatchHandle { worker, cancel })
    }

    /// Request a stop. The current output still runs to completion.
    ///
    /// Returns false when nothing is running.
    pub fn stop(&self) -> bool {
        {
            let control = self.control.lock();
            match (&control.state, &control.cancel) {
                (BatchState::Running, Some(cancel)) => cancel.cancel(),
                _ => return false,
            }
        }
        self.hub.publish(PipelineEvent::log(
            MessagePrefix::Warning.format("Stop requested, finishing the current output"),
            Severity::Warning,
        ));
        true
    }

    fn batch_logger(&self, request: &BatchRequest) -> RunLogger {
        let name = request.product_name();
        if let Some(dir) = &self.log_dir {
            match RunLogger::new(&name, Some(dir), self.log_config.clone(), self.hub.clone()) {
                Ok(logger) => return logger,
                Err(e) => tracing::warn!("Batch log file unavailable in {}: {}", dir.display(), e),
            }
        }
        RunLogger::detached(name, self.log_config.clone(), self.hub.clone())
    }
}
