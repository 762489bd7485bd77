//! Suppressor configuration.
//!
//! Invalid values are rejected here, at the configuration boundary, so the
//! state machine can assume non-negative, in-range parameters throughout.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::MIN_REPETITIONS_MAX;

/// Configuration for a [`crate::suppressor::BundleSuppressor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressorConfig {
    /// How many leading repetitions are reported individually before
    /// bundling begins.
    pub min_repetitions: u32,

    /// Seconds of silence after which a pending bundle is force-flushed.
    /// Zero disables forced flushes.
    pub max_delay_secs: f64,
}

impl Default for SuppressorConfig {
    fn default() -> Self {
        Self {
            min_repetitions: 5,
            max_delay_secs: 600.0,
        }
    }
}

/// Error type for configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "min_repetitions {value} exceeds the maximum of {MIN_REPETITIONS_MAX}"
    )]
    MinRepetitionsTooLarge { value: u32 },

    #[error("max_delay_secs must be a finite, non-negative number, got {value}")]
    InvalidMaxDelay { value: f64 },
}

impl SuppressorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_repetitions > MIN_REPETITIONS_MAX {
            return Err(ConfigError::MinRepetitionsTooLarge {
                value: self.min_repetitions,
            });
        }
        if !self.max_delay_secs.is_finite() || self.max_delay_secs < 0.0 {
            return Err(ConfigError::InvalidMaxDelay {
                value: self.max_delay_secs,
            });
        }
        Ok(())
    }

    /// The force-flush window as a [`Duration`]. Zero means disabled.
    ///
    /// Callers must have validated the configuration first.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_delay_secs).unwrap_or(Duration::ZERO)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SuppressorConfig::default();
        assert_eq!(config.min_repetitions, 5);
        assert!((config.max_delay_secs - 600.0).abs() < f64::EPSILON);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_negative_delay() {
        let config = SuppressorConfig {
            max_delay_secs: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxDelay { .. })
        ));
    }

    #[test]
    fn rejects_nan_delay() {
        let config = SuppressorConfig {
            max_delay_secs: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversize_min_repetitions() {
        let config = SuppressorConfig {
            min_repetitions: MIN_REPETITIONS_MAX + 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MinRepetitionsTooLarge { .. })
        ));
    }

    #[test]
    fn boundary_min_repetitions_is_valid() {
        let config = SuppressorConfig {
            min_repetitions: MIN_REPETITIONS_MAX,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn zero_delay_means_disabled() {
        let config = SuppressorConfig {
            max_delay_secs: 0.0,
            ..Default::default()
        };
        config.validate().unwrap();
        assert!(config.max_delay().is_zero());
    }

    #[test]
    fn max_delay_conversion() {
        let config = SuppressorConfig {
            max_delay_secs: 2.5,
            ..Default::default()
        };
        assert_eq!(config.max_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn serde_defaults_from_empty_json() {
        let config: SuppressorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.min_repetitions, 5);
    }

    #[test]
    fn serde_roundtrip() {
        let config = SuppressorConfig {
            min_repetitions: 3,
            max_delay_secs: 2.0,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SuppressorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.min_repetitions, 3);
        assert!((back.max_delay_secs - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn error_display() {
        let err = ConfigError::MinRepetitionsTooLarge { value: 5000 };
        assert!(err.to_string().contains("5000"));
        assert!(err.to_string().contains("1000"));
        let err = ConfigError::InvalidMaxDelay { value: -3.0 };
        assert!(err.to_string().contains("-3"));
    }
}
