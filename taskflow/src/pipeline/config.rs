//! Configuration for pipeline relays.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration shared by every relay in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Values a relay may buffer for its consumer.
    ///
    /// Cancellation can still let up to this many buffered values reach a
    /// consumer that was already waiting on them, so keep it small.
    #[serde(default = "default_relay_capacity")]
    pub relay_capacity: usize,
}

const fn default_relay_capacity() -> usize {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relay_capacity: default_relay_capacity(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relay capacity.
    #[must_use]
    pub const fn with_relay_capacity(mut self, relay_capacity: usize) -> Self {
        self.relay_capacity = relay_capacity;
        self
    }

    /// Checks that the configuration can build a chain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay_capacity == 0 {
            return Err(ConfigError::InvalidRelayCapacity {
                capacity: self.relay_capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        let config = PipelineConfig::new();
        assert_eq!(config.relay_capacity, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = PipelineConfig::new().with_relay_capacity(0).validate().unwrap_err();
        assert_eq!(err, ConfigError::InvalidRelayCapacity { capacity: 0 });
    }

    #[test]
    fn test_from_json() {
        let config: PipelineConfig = serde_json::from_str(r#"{"relay_capacity": 16}"#).unwrap();
        assert_eq!(config.relay_capacity, 16);

        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
