//! Error types for the taskflow crate.
//!
//! Task bodies fail with [`anyhow::Error`]; those errors are absorbed by the
//! executor and never surface here. The types below describe how an
//! orchestration call as a whole can fail.

use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for taskflow operations.
#[derive(Debug, Error)]
pub enum TaskflowError {
    /// A configuration value was rejected.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A batch execution did not complete.
    #[error("{0}")]
    Execute(#[from] ExecuteError),
}

/// Error raised when a configuration value is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The executor needs at least one worker.
    #[error("Invalid parallelism: {parallelism} (at least one worker is required)")]
    InvalidParallelism {
        /// The rejected worker count.
        parallelism: usize,
    },

    /// Relay channels are bounded and need room for one value.
    #[error("Invalid relay capacity: {capacity} (must be at least 1)")]
    InvalidRelayCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// The global tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),
}

/// Error returned by [`crate::executor::execute`].
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The request was rejected before any task started.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Enough tasks failed to reach the configured error limit.
    #[error("errors limit exceeded: {failed} failed of {attempted} attempted (limit {limit})")]
    ErrorsLimitExceeded {
        /// Failures observed by the aggregator, including reports that
        /// arrived after cancellation.
        failed: usize,
        /// The limit that was reached.
        limit: usize,
        /// Tasks that were started before the pool stopped.
        attempted: usize,
    },

    /// An internal orchestration task could not be joined.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExecuteError {
    /// Returns true if this error is the fail-fast outcome.
    #[must_use]
    pub const fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::ErrorsLimitExceeded { .. })
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::Config(err) => {
                map.insert("type".to_string(), json!("ConfigError"));
                map.insert("reason".to_string(), json!(err.to_string()));
            }
            Self::ErrorsLimitExceeded { failed, limit, attempted } => {
                map.insert("type".to_string(), json!("ErrorsLimitExceeded"));
                map.insert("failed".to_string(), json!(failed));
                map.insert("limit".to_string(), json!(limit));
                map.insert("attempted".to_string(), json!(attempted));
            }
            Self::Internal(reason) => {
                map.insert("type".to_string(), json!("InternalError"));
                map.insert("reason".to_string(), json!(reason));
            }
        }

        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}
