//! Broadcast stream configuration.

use std::time::Duration;

use crate::error::{Result, StreamError};

/// Default period between samples.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(700);

/// Longest accepted period between samples.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default per-subscriber buffer, in samples.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 16;

/// Tick period and per-subscriber buffering for a [`TelemetryStream`](crate::TelemetryStream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Time between two samples. Must be non-zero and at most [`MAX_TICK_INTERVAL`].
    pub tick_interval: Duration,
    /// Samples a subscriber may fall behind before it is dropped. Must be non-zero.
    pub subscriber_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

impl StreamConfig {
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_subscriber_buffer(mut self, subscriber_buffer: usize) -> Self {
        self.subscriber_buffer = subscriber_buffer;
        self
    }

    /// Check the configuration. `start()` runs this before arming the timer.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(StreamError::Configuration(
                "tick interval must be positive".to_string(),
            ));
        }
        if self.tick_interval > MAX_TICK_INTERVAL {
            return Err(StreamError::Configuration(format!(
                "tick interval must not exceed {}s",
                MAX_TICK_INTERVAL.as_secs()
            )));
        }
        if self.subscriber_buffer == 0 {
            return Err(StreamError::Configuration(
                "subscriber buffer must hold at least one sample".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(700));
        assert_eq!(config.subscriber_buffer, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = StreamConfig::default().with_tick_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(StreamError::Configuration(_))
        ));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let config = StreamConfig::default().with_tick_interval(Duration::MAX);
        assert!(matches!(
            config.validate(),
            Err(StreamError::Configuration(_))
        ));

        let just_over = StreamConfig::default()
            .with_tick_interval(MAX_TICK_INTERVAL + Duration::from_millis(1));
        assert!(just_over.validate().is_err());

        let at_limit = StreamConfig::default().with_tick_interval(MAX_TICK_INTERVAL);
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = StreamConfig::default().with_subscriber_buffer(0);
        assert!(matches!(
            config.validate(),
            Err(StreamError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder_overrides() {
        let config = StreamConfig::default()
            .with_tick_interval(Duration::from_millis(100))
            .with_subscriber_buffer(2);
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.subscriber_buffer, 2);
    }
}
