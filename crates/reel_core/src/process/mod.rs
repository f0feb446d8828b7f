//! External process execution.
//!
//! Every media transform is one [`Invocation`] handed to a
//! [`CommandRunner`]. The runner streams the tool's error output to an
//! [`OutputSink`], turns `Duration:`/`time=` lines into progress ticks, and
//! always resolves to a [`CommandOutcome`] instead of an error.

mod invocation;
mod progress;
mod runner;

pub use invocation::Invocation;
pub use progress::{is_status_line, parse_timestamp, LineSplitter, ProgressTracker};
pub use runner::{
    remove_scratch, CleanupWarning, CommandFailure, CommandOutcome, CommandRunner, FailureKind,
    NullSink, OutputSink, SystemRunner,
};
