//! Bounded-parallelism batch execution.
//!
//! This module provides:
//! - The [`Task`] trait and closure adapters
//! - [`ExecutorConfig`] and its interpreted [`ErrorLimit`]
//! - [`Executor`] / [`execute`], a fixed worker pool that cancels itself
//!   once enough tasks fail

mod config;
mod pool;
mod task;

pub use config::{ErrorLimit, ExecutorConfig};
pub use pool::{execute, ExecutionSummary, Executor, LIMIT_EXCEEDED_REASON};
pub use task::{blocking_task, task_fn, BlockingTask, FnTask, SharedTask, Task};
