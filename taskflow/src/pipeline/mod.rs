//! Cancellable multi-stage stream pipelines.
//!
//! This module provides:
//! - The [`Stage`] trait and the [`map`], [`filter`], [`then`] and
//!   [`inspect`] combinators
//! - [`chain`], which interposes a cancellation-aware relay after every stage
//! - [`Pipeline`] and [`PipelineBuilder`] for reusable stage lists

mod builder;
mod chain;
mod config;
mod relay;
mod stage;

pub use builder::{Pipeline, PipelineBuilder};
pub use chain::chain;
pub use config::PipelineConfig;
pub use stage::{filter, inspect, map, then, Stage, ValueStream};
