//! Fakes for exercising steps and batches without ffmpeg.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use super::batch::CancelHandle;
use super::selection::FirstSelector;
use super::types::Context;
use crate::config::{CompositionSettings, EncodingSettings, SubtitleSettings, ToolPaths};
use crate::events::{EventHub, PipelineEvent};
use crate::logging::{LogConfig, RunLogger};
use crate::probe::{InspectionError, InspectionResult, MediaProbe};
use crate::process::{
    remove_scratch, CommandFailure, CommandOutcome, CommandRunner, FailureKind, Invocation,
    OutputSink,
};
use crate::stages::StageExecutor;

/// Runner that records invocations and creates each declared output.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    fail_label: Option<String>,
    fail_in_output: Option<usize>,
    cancel_in_output: Option<(usize, CancelHandle)>,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    list_entries: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every invocation with this label.
    pub fn fail_stage(mut self, label: &str) -> Self {
        self.fail_label = Some(label.to_string());
        self
    }

    /// Restrict `fail_stage` to one output index.
    pub fn only_in_output(mut self, index: usize) -> Self {
        self.fail_in_output = Some(index);
        self
    }

    /// Request a stop when the first command of output `index` runs.
    pub fn cancel_during(mut self, index: usize, handle: CancelHandle) -> Self {
        self.cancel_in_output = Some((index, handle));
        self
    }

    /// Block the first invocation until `gate` receives (or hangs up).
    /// `reached` is signalled when that invocation starts waiting.
    pub fn gated(self, reached: Sender<()>, gate: Receiver<()>) -> Self {
        *self.gate.lock() = Some((reached, gate));
        self
    }

    /// Arm the gate on a runner that is already shared.
    pub fn gate_slot(&self) -> MutexGuard<'_, Option<(Sender<()>, Receiver<()>)>> {
        self.gate.lock()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.label.clone()).collect()
    }

    /// Every `file '…'` line read from a scratch list, resolved against the
    /// list's own folder as ffmpeg's concat demuxer does, with whether the
    /// resolved file existed when the command ran.
    pub fn list_entries(&self) -> Vec<(PathBuf, bool)> {
        self.list_entries.lock().clone()
    }

    fn record_list_entries(&self, list: &Path) {
        let Ok(text) = fs::read_to_string(list) else {
            return;
        };
        let base = list.parent().unwrap_or(Path::new(""));
        let mut entries = self.list_entries.lock();
        for line in text.lines() {
            if let Some(quoted) = line.strip_prefix("file '").and_then(|l| l.strip_suffix('\'')) {
                let resolved = base.join(quoted.replace("'\\''", "'"));
                let exists = resolved.exists();
                entries.push((resolved, exists));
            }
        }
    }

    /// Labels of invocations whose output lies in output `index`'s workspace.
    pub fn labels_in_output(&self, index: usize) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.output.as_deref().is_some_and(|p| in_output(p, index)))
            .map(|c| c.label.clone())
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation, sink: &dyn OutputSink) -> CommandOutcome {
        let gate = self.gate.lock().take();
        if let Some((reached, gate)) = gate {
            let _ = reached.send(());
            let _ = gate.recv();
        }

        self.calls.lock().push(invocation.clone());
        for list in &invocation.scratch {
            self.record_list_entries(list);
        }
        sink.command(&invocation.command_line());
        let output = invocation.output.clone().unwrap_or_default();

        if let Some((index, handle)) = &self.cancel_in_output {
            if in_output(&output, *index) {
                handle.cancel();
            }
        }

        let label_matches = self.fail_label.as_deref() == Some(invocation.label.as_str());
        let output_matches = self.fail_in_output.map_or(true, |i| in_output(&output, i));
        if label_matches && output_matches {
            sink.output_line("Conversion failed!");
            return CommandOutcome::Failure(CommandFailure::new(
                invocation,
                FailureKind::Exit(Some(1)),
                vec!["Conversion failed!".to_string()],
            ));
        }

        if let Err(e) = fs::write(&output, invocation.label.as_bytes()) {
            return CommandOutcome::Failure(CommandFailure::new(
                invocation,
                FailureKind::Spawn(e.to_string()),
                Vec::new(),
            ));
        }
        remove_scratch(&invocation.scratch, sink);
        sink.progress(&invocation.label, 100);
        CommandOutcome::Success {
            elapsed: Duration::from_millis(1),
        }
    }
}

/// Whether `path` is inside a `temp_<index>_*` workspace.
fn in_output(path: &Path, index: usize) -> bool {
    let prefix = format!("temp_{}_", index);
    path.components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with(&prefix))
}

/// Probe answering from a table keyed by file name.
#[derive(Default, Clone)]
pub struct FakeProbe {
    durations: HashMap<String, f64>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: &str, secs: f64) -> Self {
        self.durations.insert(file_name.to_string(), secs);
        self
    }
}

impl MediaProbe for FakeProbe {
    fn duration(&self, path: &Path) -> InspectionResult<f64> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.durations
            .get(&name)
            .copied()
            .ok_or_else(|| InspectionError::ProbeFailed {
                path: path.to_path_buf(),
                message: "unknown file".to_string(),
            })
    }
}

/// Stage executor over the given runner with default settings.
pub fn executor(runner: Arc<FakeRunner>) -> StageExecutor {
    StageExecutor::new(
        runner,
        &ToolPaths::system(),
        EncodingSettings::default(),
        SubtitleSettings::default(),
    )
}

/// Context for output 1 of 1 in `product_dir`, with an existing work dir.
pub fn context_with(
    product_dir: &Path,
    runner: Arc<FakeRunner>,
    probe: FakeProbe,
) -> (Context, Receiver<PipelineEvent>) {
    let work_dir = product_dir.join("temp_1_test00");
    fs::create_dir_all(&work_dir).unwrap();

    let hub = EventHub::new();
    let rx = hub.subscribe();
    let logger = RunLogger::detached("test", LogConfig::default(), hub);

    let composition = CompositionSettings::default();
    let ctx = Context {
        product_dir: product_dir.to_path_buf(),
        product_name: product_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        output_index: 1,
        output_count: 1,
        work_dir,
        output_dir: product_dir.join(&composition.output_folder),
        composition,
        stages: Arc::new(executor(runner)),
        probe: Arc::new(probe),
        selector: Arc::new(FirstSelector),
        logger: Arc::new(logger),
    };
    (ctx, rx)
}

/// Context with a fresh runner and an empty probe.
pub fn context_for(product_dir: &Path) -> (Context, Receiver<PipelineEvent>) {
    context_with(product_dir, Arc::new(FakeRunner::new()), FakeProbe::new())
}

/// Product folder `root/<name>` with scenes A and B and matching probe.
///
/// Scene A's footage is longer than its narration, scene B's is shorter.
pub fn product_fixture(root: &Path, name: &str) -> (PathBuf, FakeProbe) {
    let product = root.join(name);
    for (scene, audio, video) in [("A", "你好.mp3", "a.mp4"), ("B", "再见.mp3", "b.mp4")] {
        let dir = product.join(scene);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(audio), b"").unwrap();
        fs::write(dir.join(video), b"").unwrap();
    }
    let probe = FakeProbe::new()
        .with("你好.mp3", 3.0)
        .with("a.mp4", 5.0)
        .with("再见.mp3", 4.0)
        .with("b.mp4", 2.0);
    (product, probe)
}
