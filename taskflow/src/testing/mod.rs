//! Testing utilities for executors and pipelines.
//!
//! This module provides:
//! - Tasks with recorded, failing, panicking and slow behavior
//! - A probe that measures how many tasks run at once
//! - Stream constructors and a timeout-guarded collector

mod streams;
mod tasks;

pub use streams::{collect_with_timeout, counting_stream, stream_of};
pub use tasks::{ConcurrencyProbe, EagerPanicTask, PanickingTask, RecordingTask};
