//! Event sink system for observability.
//!
//! The executor and the pipeline report lifecycle events through an
//! [`EventSink`]. Event types are the constants below; payloads are JSON.

mod sink;

pub use sink::{CollectingEventSink, Event, EventSink, LoggingEventSink, NoOpEventSink};

/// A batch execution started.
pub const EXECUTION_STARTED: &str = "execution.started";
/// A batch execution finished without reaching its error limit.
pub const EXECUTION_COMPLETED: &str = "execution.completed";
/// The error limit was reached and the worker pool was cancelled.
pub const EXECUTION_CANCELLED: &str = "execution.cancelled";
/// A single task returned an error or panicked.
pub const TASK_FAILED: &str = "task.failed";
/// A pipeline relay stopped forwarding values.
pub const RELAY_STOPPED: &str = "pipeline.relay_stopped";
