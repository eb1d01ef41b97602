//! Lifecycle events and the sinks that receive them.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::Level;

/// One lifecycle event reported by the executor or a relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// One of the event-type constants in [`crate::events`].
    pub kind: &'static str,
    /// JSON payload; `Null` when there is nothing to report.
    pub data: Value,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub const fn new(kind: &'static str, data: Value) -> Self {
        Self { kind, data }
    }
}

/// Receives lifecycle events.
///
/// Workers, the aggregator and relays call [`emit`](Self::emit) inline, so
/// implementations must return quickly and must never panic.
pub trait EventSink: Send + Sync {
    /// Records one event.
    fn emit(&self, event: Event);
}

/// Discards every event. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: Event) {}
}

/// Forwards events to `tracing` at a fixed level under the
/// `taskflow::events` target.
#[derive(Debug, Clone, Copy)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggingEventSink {
    /// Creates a sink logging at `level`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Returns the level events are logged at.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: Event) {
        let Event { kind, data } = event;
        // `tracing` needs the level at compile time.
        if self.level == Level::TRACE {
            tracing::trace!(target: "taskflow::events", kind, %data, "Event");
        } else if self.level == Level::DEBUG {
            tracing::debug!(target: "taskflow::events", kind, %data, "Event");
        } else if self.level == Level::INFO {
            tracing::info!(target: "taskflow::events", kind, %data, "Event");
        } else if self.level == Level::WARN {
            tracing::warn!(target: "taskflow::events", kind, %data, "Event");
        } else {
            tracing::error!(target: "taskflow::events", kind, %data, "Event");
        }
    }
}

/// Keeps every event in memory. Meant for tests and diagnostics.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<Event>>,
    arrived: Notify,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event so far, in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Returns the kinds of every event so far, in arrival order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }

    /// Returns the events of one kind.
    #[must_use]
    pub fn events_of_type(&self, kind: &str) -> Vec<Event> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Returns the number of events of one kind.
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Waits until at least `count` events of `kind` arrived, or `limit`
    /// elapsed. Returns how many had arrived.
    ///
    /// Relays report after they close their output, so a consumer that saw
    /// the end of a stream may still have to wait for the event.
    pub async fn wait_for(&self, kind: &str, count: usize, limit: Duration) -> usize {
        let wait = async {
            loop {
                let arrived = self.arrived.notified();
                let seen = self.count(kind);
                if seen >= count {
                    return seen;
                }
                arrived.await;
            }
        };
        match tokio::time::timeout(limit, wait).await {
            Ok(seen) => seen,
            Err(_) => self.count(kind),
        }
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
        self.arrived.notify_waiters();
    }
}
