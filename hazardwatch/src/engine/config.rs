//! Engine configuration with construction-time validation.

use std::fmt;
use std::time::Duration;

use crate::refresh::DEFAULT_REFRESH_DISTANCE_M;

/// Default dwell threshold before a zone is confirmed: 5000 ms.
pub const DEFAULT_DWELL_MS: u64 = 5_000;

/// Default capacity of the danger state broadcast channel.
pub const DEFAULT_DANGER_CHANNEL_CAPACITY: usize = 16;

/// Configuration for the hazard engine.
///
/// Invalid values are rejected by [`EngineConfig::validate`] at engine
/// construction, never at runtime: debouncing safety depends on a sane
/// dwell threshold.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum continuous containment before a zone is confirmed.
    pub dwell: Duration,

    /// Displacement from the fetch anchor that triggers a hazard
    /// refresh, in meters.
    pub refresh_distance_m: f64,

    /// Capacity of the danger state broadcast channel. Slow subscribers
    /// lag rather than block the pipeline.
    pub danger_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dwell: Duration::from_millis(DEFAULT_DWELL_MS),
            refresh_distance_m: DEFAULT_REFRESH_DISTANCE_M,
            danger_channel_capacity: DEFAULT_DANGER_CHANNEL_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dwell threshold.
    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }

    /// Set the refresh displacement threshold in meters.
    pub fn with_refresh_distance_m(mut self, meters: f64) -> Self {
        self.refresh_distance_m = meters;
        self
    }

    /// Set the danger broadcast channel capacity.
    pub fn with_danger_channel_capacity(mut self, capacity: usize) -> Self {
        self.danger_channel_capacity = capacity;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero dwell, a non-finite or
    /// non-positive refresh distance, or a zero channel capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dwell.is_zero() {
            return Err(ConfigError::ZeroDwell);
        }
        if !self.refresh_distance_m.is_finite() || self.refresh_distance_m <= 0.0 {
            return Err(ConfigError::InvalidRefreshDistance(self.refresh_distance_m));
        }
        if self.danger_channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        Ok(())
    }
}

/// Errors from engine configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Dwell threshold must be positive.
    ZeroDwell,

    /// Refresh distance must be a finite positive number of meters.
    InvalidRefreshDistance(f64),

    /// Broadcast channel capacity must be at least 1.
    ZeroChannelCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroDwell => {
                write!(f, "Dwell threshold must be greater than zero")
            }
            ConfigError::InvalidRefreshDistance(meters) => {
                write!(
                    f,
                    "Refresh distance must be a finite positive number of meters, got {}",
                    meters
                )
            }
            ConfigError::ZeroChannelCapacity => {
                write!(f, "Danger channel capacity must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dwell, Duration::from_millis(5000));
        assert_eq!(config.refresh_distance_m, 5_000.0);
    }

    #[test]
    fn test_zero_dwell_rejected() {
        let config = EngineConfig::new().with_dwell(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroDwell));
    }

    #[test]
    fn test_invalid_refresh_distance_rejected() {
        let negative = EngineConfig::new().with_refresh_distance_m(-1.0);
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::InvalidRefreshDistance(_))
        ));

        let nan = EngineConfig::new().with_refresh_distance_m(f64::NAN);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_zero_channel_capacity_rejected() {
        let config = EngineConfig::new().with_danger_channel_capacity(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroChannelCapacity));
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidRefreshDistance(-5.0);
        assert!(err.to_string().contains("-5"));
        assert!(ConfigError::ZeroDwell.to_string().contains("Dwell"));
    }
}
