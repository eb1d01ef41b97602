//! Configuration for the worker pool executor.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many failures an execution tolerates before it is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorLimit {
    /// Failures are counted but never stop the pool.
    Unlimited,
    /// The pool is cancelled once this many failures are observed.
    Limit(usize),
}

impl ErrorLimit {
    /// Interprets a raw error threshold.
    ///
    /// Zero and negative thresholds mean "never stop early".
    #[must_use]
    pub fn from_threshold(threshold: i64) -> Self {
        if threshold <= 0 {
            Self::Unlimited
        } else {
            Self::Limit(usize::try_from(threshold).unwrap_or(usize::MAX))
        }
    }

    /// Returns true once `failures` has reached the limit.
    #[must_use]
    pub const fn is_reached(&self, failures: usize) -> bool {
        match self {
            Self::Unlimited => false,
            Self::Limit(max) => failures >= *max,
        }
    }
}

impl fmt::Display for ErrorLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Limit(max) => write!(f, "{max}"),
        }
    }
}

/// Configuration for a batch execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Number of concurrent workers. Must be at least 1.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Failures that cancel the execution; `<= 0` tolerates any number.
    #[serde(default)]
    pub error_threshold: i64,
}

const fn default_parallelism() -> usize {
    1
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            error_threshold: 0,
        }
    }
}

impl ExecutorConfig {
    /// Creates a new executor configuration.
    #[must_use]
    pub const fn new(parallelism: usize, error_threshold: i64) -> Self {
        Self {
            parallelism,
            error_threshold,
        }
    }

    /// Sets the number of workers.
    #[must_use]
    pub const fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Sets the error threshold.
    #[must_use]
    pub const fn with_error_threshold(mut self, error_threshold: i64) -> Self {
        self.error_threshold = error_threshold;
        self
    }

    /// Returns the interpreted error limit.
    #[must_use]
    pub fn error_limit(&self) -> ErrorLimit {
        ErrorLimit::from_threshold(self.error_threshold)
    }

    /// Checks the configuration before any worker is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelism == 0 {
            return Err(ConfigError::InvalidParallelism {
                parallelism: self.parallelism,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_limit_from_threshold() {
        assert_eq!(ErrorLimit::from_threshold(0), ErrorLimit::Unlimited);
        assert_eq!(ErrorLimit::from_threshold(-5), ErrorLimit::Unlimited);
        assert_eq!(ErrorLimit::from_threshold(3), ErrorLimit::Limit(3));
    }

    #[test]
    fn test_error_limit_is_reached() {
        let limit = ErrorLimit::Limit(2);
        assert!(!limit.is_reached(1));
        assert!(limit.is_reached(2));
        assert!(limit.is_reached(3));

        assert!(!ErrorLimit::Unlimited.is_reached(usize::MAX));
    }

    #[test]
    fn test_error_limit_display() {
        assert_eq!(ErrorLimit::Unlimited.to_string(), "unlimited");
        assert_eq!(ErrorLimit::Limit(7).to_string(), "7");
    }

    #[test]
    fn test_config_builder() {
        let config = ExecutorConfig::default()
            .with_parallelism(4)
            .with_error_threshold(10);

        assert_eq!(config, ExecutorConfig::new(4, 10));
        assert_eq!(config.error_limit(), ErrorLimit::Limit(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_parallelism() {
        let err = ExecutorConfig::new(0, 1).validate().unwrap_err();
        assert_eq!(err, ConfigError::InvalidParallelism { parallelism: 0 });
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config: ExecutorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ExecutorConfig::default());

        let config: ExecutorConfig =
            serde_json::from_str(r#"{"parallelism": 8, "error_threshold": -1}"#).unwrap();
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.error_limit(), ErrorLimit::Unlimited);
    }
}
