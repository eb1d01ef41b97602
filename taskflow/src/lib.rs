//! # Taskflow
//!
//! Concurrency primitives for running many fallible jobs and for wiring
//! stream stages together, both built on Tokio.
//!
//! Taskflow provides:
//!
//! - **Bounded batch execution**: run a list of tasks on a fixed number of
//!   workers and stop early once enough of them fail
//! - **Cancellable pipelines**: chain stream stages with a relay after each
//!   one, so a single token shuts the whole chain down
//! - **Event-driven observability**: lifecycle events through pluggable sinks
//!   next to structured `tracing` output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taskflow::prelude::*;
//!
//! let tasks: Vec<SharedTask> = urls
//!     .into_iter()
//!     .map(|url| task_fn(url.clone(), move || fetch(url.clone())))
//!     .collect();
//! let summary = execute(tasks, ExecutorConfig::new(8, 3)).await?;
//!
//! let cancel = Arc::new(CancellationToken::new());
//! let pipeline = Pipeline::builder("numbers")
//!     .stage("double", map(|v: u64| v * 2))
//!     .build()?;
//! let output = pipeline.run(input, cancel.clone());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod errors;
pub mod events;
pub mod executor;
pub mod observability;
pub mod pipeline;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::errors::{ConfigError, ExecuteError, TaskflowError};
    pub use crate::events::{CollectingEventSink, Event, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::executor::{
        blocking_task, execute, task_fn, ErrorLimit, ExecutionSummary, Executor, ExecutorConfig,
        SharedTask, Task,
    };
    pub use crate::observability::{init_tracing, TracingConfig};
    pub use crate::pipeline::{
        chain, filter, inspect, map, then, Pipeline, PipelineBuilder, PipelineConfig, Stage,
        ValueStream,
    };
}
