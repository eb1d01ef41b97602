//! Test tasks with observable behavior.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::executor::{SharedTask, Task};

/// A task that records how often it ran and returns a fixed outcome.
#[derive(Debug)]
pub struct RecordingTask {
    name: String,
    fail: bool,
    delay: Option<Duration>,
    call_count: AtomicUsize,
}

impl RecordingTask {
    /// Creates a task that always succeeds.
    #[must_use]
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail: false,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Creates a task that always fails.
    #[must_use]
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::ok(name)
        }
    }

    /// Sleeps for `delay` before returning.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of times the task was run.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Task for RecordingTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> anyhow::Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            anyhow::bail!("task '{}' failed", self.name);
        }
        Ok(())
    }
}

/// A task that panics when run.
#[derive(Debug, Clone)]
pub struct PanickingTask {
    name: String,
}

impl PanickingTask {
    /// Creates a new panicking task.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Task for PanickingTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> anyhow::Result<()> {
        panic!("task '{}' panicked", self.name);
    }
}

/// A task whose `run` panics before it hands back a future.
///
/// Written without `#[async_trait]` so the panic happens in the plain
/// function body rather than on first poll.
#[derive(Debug, Clone)]
pub struct EagerPanicTask {
    name: String,
}

impl EagerPanicTask {
    /// Creates a new eagerly panicking task.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Task for EagerPanicTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn run<'life0, 'async_trait>(
        &'life0 self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        Self: 'async_trait,
    {
        panic!("task '{}' panicked before running", self.name);
    }
}

/// Tracks how many of its tasks are running at once.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    /// Creates a new probe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a task that holds a slot on the probe for `hold`.
    #[must_use]
    pub fn task(&self, name: impl Into<String>, hold: Duration) -> SharedTask {
        Arc::new(ProbeTask {
            name: name.into(),
            hold,
            probe: self.clone(),
        })
    }

    /// Returns the highest number of tasks seen running together.
    #[must_use]
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Returns the number of probe tasks that finished.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct ProbeTask {
    name: String,
    hold: Duration,
    probe: ConcurrencyProbe,
}

#[async_trait]
impl Task for ProbeTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> anyhow::Result<()> {
        let now = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_active.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.hold).await;

        self.probe.active.fetch_sub(1, Ordering::SeqCst);
        self.probe.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
