//! Typed event stream for batch observers.
//!
//! The orchestrator publishes log lines, progress ticks and processing
//! state changes. Any number of subscribers (UI bridge, CLI printer,
//! tests) receive every event published after they subscribed.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity attached to a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

/// Event emitted while a batch is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PipelineEvent {
    /// A narrated log line.
    Log { message: String, severity: Severity },

    /// Progress of a named operation (0-100).
    Progress { operation: String, percent: u32 },

    /// Processing state changed. `false` is the terminal event of a batch.
    #[serde(rename_all = "camelCase")]
    State { is_processing: bool },
}

impl PipelineEvent {
    /// Create a log event.
    pub fn log(message: impl Into<String>, severity: Severity) -> Self {
        Self::Log {
            message: message.into(),
            severity,
        }
    }

    /// Create a progress event.
    pub fn progress(operation: impl Into<String>, percent: u32) -> Self {
        Self::Progress {
            operation: operation.into(),
            percent: percent.min(100),
        }
    }

    /// Whether this event marks the end of processing.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineEvent::State {
                is_processing: false
            }
        )
    }
}

/// Fan-out hub for pipeline events.
///
/// Cloning the hub shares the subscriber list.
#[derive(Clone, Default)]
pub struct EventHub {
    subscribers: Arc<Mutex<Vec<Sender<PipelineEvent>>>>,
}

impl EventHub {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Receiver<PipelineEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    ///
    /// Subscribers whose receiver was dropped are removed.
    pub fn publish(&self, event: PipelineEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives_events() {
        let hub = EventHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.publish(PipelineEvent::log("hello", Severity::Info));

        assert_eq!(a.try_recv().unwrap(), PipelineEvent::log("hello", Severity::Info));
        assert_eq!(b.try_recv().unwrap(), PipelineEvent::log("hello", Severity::Info));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub = EventHub::new();
        let keep = hub.subscribe();
        drop(hub.subscribe());

        hub.publish(PipelineEvent::progress("Trim", 50));

        assert_eq!(hub.subscriber_count(), 1);
        assert!(keep.try_recv().is_ok());
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(
            PipelineEvent::progress("Mux", 250),
            PipelineEvent::Progress {
                operation: "Mux".to_string(),
                percent: 100
            }
        );
    }

    #[test]
    fn state_event_serializes_for_ui_bridge() {
        let json = serde_json::to_string(&PipelineEvent::State {
            is_processing: false,
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"state","isProcessing":false}"#);
        assert!(PipelineEvent::State {
            is_processing: false
        }
        .is_terminal());
    }

    #[test]
    fn log_event_serializes_severity_lowercase() {
        let json = serde_json::to_string(&PipelineEvent::log("x", Severity::Warning)).unwrap();
        assert!(json.contains(r#""severity":"warning""#));
        assert!(json.contains(r#""event":"log""#));
    }
}
