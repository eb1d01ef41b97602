//! Bounded worker pool with a fail-fast error limit.
//!
//! One execution runs three kinds of Tokio tasks:
//!
//! - a **feeder** that pulls tasks from the caller's iterator and hands them
//!   over a bounded channel, one at a time;
//! - `parallelism` **workers** that take the next task, run it, and report
//!   failures;
//! - one **aggregator** that owns the failure counter and cancels the shared
//!   token when the limit is reached.
//!
//! Every wait in the feeder and the workers is a `tokio::select!` between
//! data and cancellation. [`Executor::execute`] joins all of them before it
//! returns.

use super::config::{ErrorLimit, ExecutorConfig};
use super::task::SharedTask;
use crate::cancellation::CancellationToken;
use crate::errors::ExecuteError;
use crate::events::{
    Event, EventSink, NoOpEventSink, EXECUTION_CANCELLED, EXECUTION_COMPLETED, EXECUTION_STARTED,
    TASK_FAILED,
};
use crate::observability::SpanTimer;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Cancellation reason used when the error limit is reached.
pub const LIMIT_EXCEEDED_REASON: &str = "errors limit exceeded";

/// Cancellation reason used when a worker dies outside a task.
const WORKER_LOST_REASON: &str = "worker lost";

/// Outcome of an execution that did not hit its error limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Tasks that were started.
    pub attempted: usize,
    /// Tasks that returned `Ok`.
    pub succeeded: usize,
    /// Tasks that returned an error or panicked.
    pub failed: usize,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

/// A failure forwarded from a worker to the aggregator.
///
/// The worker waits for `ack` before taking its next task, so a failure
/// that reaches the limit cancels the token before its own worker can
/// start anything else.
#[derive(Debug)]
struct FailureReport {
    task: String,
    error: String,
    ack: oneshot::Sender<()>,
}

/// Counts kept locally by each worker and summed after join.
#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
    attempted: usize,
    succeeded: usize,
}

impl WorkerStats {
    const fn merge(self, other: Self) -> Self {
        Self {
            attempted: self.attempted + other.attempted,
            succeeded: self.succeeded + other.succeeded,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AggregateOutcome {
    failed: usize,
    limit_reached: bool,
}

/// Runs batches of tasks on a fixed number of workers.
pub struct Executor {
    config: ExecutorConfig,
    event_sink: Arc<dyn EventSink>,
}

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink for lifecycle events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Runs every task, or stops early once the error limit is reached.
    ///
    /// `tasks` may be lazy or unbounded; only the feeder pulls from it and
    /// it stops pulling on cancellation. A zero worker count is rejected
    /// before anything is spawned.
    ///
    /// A task that never returns keeps its worker busy, so this call waits
    /// for it. Tasks are expected to finish on their own.
    pub async fn execute<I>(&self, tasks: I) -> Result<ExecutionSummary, ExecuteError>
    where
        I: IntoIterator<Item = SharedTask>,
        I::IntoIter: Send + 'static,
    {
        self.config.validate()?;

        let parallelism = self.config.parallelism;
        let limit = self.config.error_limit();
        let timer = SpanTimer::start();
        let cancel = Arc::new(CancellationToken::new());

        info!(parallelism, error_limit = %limit, "Starting batch execution");
        self.event_sink.emit(Event::new(
            EXECUTION_STARTED,
            json!({
                "parallelism": parallelism,
                "error_limit": limit.to_string(),
            }),
        ));

        let (task_tx, task_rx) = mpsc::channel::<SharedTask>(1);
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (failure_tx, failure_rx) = mpsc::channel::<FailureReport>(parallelism);

        let aggregator = tokio::spawn(aggregate_failures(
            failure_rx,
            limit,
            cancel.clone(),
            self.event_sink.clone(),
        ));

        let mut workers = JoinSet::new();
        for worker_id in 0..parallelism {
            workers.spawn(run_worker(
                worker_id,
                task_rx.clone(),
                failure_tx.clone(),
                cancel.clone(),
            ));
        }
        // Workers hold the only remaining handles, so the aggregator ends
        // when the last worker does and the feeder sees a closed channel if
        // every worker is gone.
        drop(failure_tx);
        drop(task_rx);

        let feeder = tokio::spawn(feed_tasks(tasks.into_iter(), task_tx, cancel.clone()));

        let mut stats = WorkerStats::default();
        let mut lost_worker = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(worker_stats) => stats = stats.merge(worker_stats),
                Err(e) => {
                    // Its counts are gone, so no summary can be trusted.
                    warn!(error = %e, "Worker failed to join");
                    cancel.cancel(WORKER_LOST_REASON);
                    lost_worker.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Err(e) = feeder.await {
            warn!(error = %e, "Task feeder failed to join");
        }

        let outcome = aggregator.await.map_err(|e| {
            ExecuteError::Internal(format!("failure aggregator failed to join: {e}"))
        })?;

        if let Some(error) = lost_worker {
            return Err(ExecuteError::Internal(format!("worker failed to join: {error}")));
        }

        let duration_ms = timer.elapsed_ms();

        match limit {
            ErrorLimit::Limit(max) if outcome.limit_reached => {
                warn!(
                    failed = outcome.failed,
                    attempted = stats.attempted,
                    limit = max,
                    duration_ms,
                    "Batch execution cancelled"
                );
                self.event_sink.emit(Event::new(
                    EXECUTION_CANCELLED,
                    json!({
                        "failed": outcome.failed,
                        "attempted": stats.attempted,
                        "limit": max,
                        "reason": cancel.reason(),
                    }),
                ));
                Err(ExecuteError::ErrorsLimitExceeded {
                    failed: outcome.failed,
                    limit: max,
                    attempted: stats.attempted,
                })
            }
            _ => {
                let summary = ExecutionSummary {
                    attempted: stats.attempted,
                    succeeded: stats.succeeded,
                    failed: outcome.failed,
                    duration_ms,
                };
                info!(
                    attempted = summary.attempted,
                    failed = summary.failed,
                    duration_ms,
                    "Batch execution completed"
                );
                self.event_sink.emit(Event::new(
                    EXECUTION_COMPLETED,
                    serde_json::to_value(&summary).unwrap_or_default(),
                ));
                Ok(summary)
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Runs `tasks` with `config` and no event sink.
pub async fn execute<I>(tasks: I, config: ExecutorConfig) -> Result<ExecutionSummary, ExecuteError>
where
    I: IntoIterator<Item = SharedTask>,
    I::IntoIter: Send + 'static,
{
    Executor::new(config).execute(tasks).await
}

/// Hands tasks to the workers until the source is exhausted or cancelled.
async fn feed_tasks<I>(tasks: I, tx: mpsc::Sender<SharedTask>, cancel: Arc<CancellationToken>)
where
    I: Iterator<Item = SharedTask>,
{
    let mut fed = 0usize;
    for task in tasks {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            sent = tx.send(task) => {
                if sent.is_err() {
                    break;
                }
                fed += 1;
            }
        }
    }
    debug!(fed, cancelled = cancel.is_cancelled(), "Task feeder stopped");
}

async fn next_task(tasks: &Mutex<mpsc::Receiver<SharedTask>>) -> Option<SharedTask> {
    tasks.lock().await.recv().await
}

async fn run_worker(
    worker_id: usize,
    tasks: Arc<Mutex<mpsc::Receiver<SharedTask>>>,
    failures: mpsc::Sender<FailureReport>,
    cancel: Arc<CancellationToken>,
) -> WorkerStats {
    let mut stats = WorkerStats::default();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = next_task(&tasks) => next,
        };
        let Some(task) = next else { break };

        stats.attempted += 1;
        // `run` itself is called inside the guard so a panic while building
        // the future is caught too.
        let guarded = AssertUnwindSafe(async { task.run().await }).catch_unwind();
        let error = match guarded.await {
            Ok(Ok(())) => {
                stats.succeeded += 1;
                continue;
            }
            Ok(Err(err)) => {
                debug!(worker_id, task = task.name(), error = %err, "Task failed");
                err.to_string()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(worker_id, task = task.name(), panic = %message, "Task panicked");
                format!("task panicked: {message}")
            }
        };

        let (ack, acked) = oneshot::channel();
        let report = FailureReport {
            task: task.name().to_string(),
            error,
            ack,
        };
        if failures.send(report).await.is_err() || acked.await.is_err() {
            break;
        }
    }

    debug!(
        worker_id,
        attempted = stats.attempted,
        succeeded = stats.succeeded,
        "Worker stopped"
    );
    stats
}

/// Owns the failure counter for one execution.
///
/// Keeps draining after cancelling so workers never block on a report.
async fn aggregate_failures(
    mut reports: mpsc::Receiver<FailureReport>,
    limit: ErrorLimit,
    cancel: Arc<CancellationToken>,
    sink: Arc<dyn EventSink>,
) -> AggregateOutcome {
    let mut failed = 0usize;
    let mut limit_reached = false;

    while let Some(report) = reports.recv().await {
        failed += 1;
        sink.emit(Event::new(
            TASK_FAILED,
            json!({
                "task": report.task,
                "error": report.error,
                "failures": failed,
            }),
        ));

        if !limit_reached && limit.is_reached(failed) {
            limit_reached = true;
            warn!(failed, limit = %limit, "Error limit reached, cancelling remaining tasks");
            cancel.cancel(LIMIT_EXCEEDED_REASON);
        }

        // The worker may already be gone; nothing to do then.
        let _ = report.ack.send(());
    }

    AggregateOutcome {
        failed,
        limit_reached,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
