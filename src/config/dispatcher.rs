//! Dispatcher configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Dispatcher configuration.
///
/// Bundles the construction-time buffer capacity with the run-time admission
/// settings so a whole dispatcher can be described in one place, loaded from
/// JSON, and validated before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Job buffer capacity; `add` is rejected once this many jobs are queued.
    pub buffer_size: usize,
    /// Maximum concurrently executing jobs; `0` lifts the limit.
    pub max_concurrent: usize,
    /// Dispatch tick period in milliseconds.
    pub tick_interval_ms: u64,
}

impl DispatcherConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the job buffer capacity.
    #[must_use]
    pub const fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the concurrency ceiling (`0` = unlimited).
    #[must_use]
    pub const fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Set the dispatch tick period, saturating at `u64::MAX` milliseconds.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The dispatch tick period as a [`Duration`].
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration values.
    ///
    /// `max_concurrent` is intentionally unrestricted: zero is the documented
    /// "unlimited" setting.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_size == 0 {
            return Err("buffer_size must be greater than 0".into());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse dispatcher configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns parse and validation failures as readable strings.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            buffer_size: 128,
            max_concurrent: num_cpus::get(),
            tick_interval_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = DispatcherConfig::new();
        assert!(cfg.validate().is_ok());
        assert!(cfg.max_concurrent >= 1);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_builder_chain() {
        let cfg = DispatcherConfig::new()
            .with_buffer_size(32)
            .with_max_concurrent(4)
            .with_tick_interval(Duration::from_millis(250));
        assert_eq!(cfg.buffer_size, 32);
        assert_eq!(cfg.max_concurrent, 4);
        assert_eq!(cfg.tick_interval_ms, 250);
    }

    #[test]
    fn test_tick_interval_saturates_at_u64_millis() {
        let cfg = DispatcherConfig::new().with_tick_interval(Duration::MAX);
        assert_eq!(cfg.tick_interval_ms, u64::MAX);
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        let cfg = DispatcherConfig::new().with_buffer_size(0);
        assert_eq!(
            cfg.validate().unwrap_err(),
            "buffer_size must be greater than 0"
        );
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let cfg = DispatcherConfig::new().with_tick_interval(Duration::ZERO);
        assert_eq!(
            cfg.validate().unwrap_err(),
            "tick_interval_ms must be greater than 0"
        );
    }

    #[test]
    fn test_zero_max_concurrent_is_allowed() {
        let cfg = DispatcherConfig::new().with_max_concurrent(0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_str() {
        let cfg = DispatcherConfig::from_json_str(
            r#"{"buffer_size": 8, "max_concurrent": 2, "tick_interval_ms": 50}"#,
        )
        .unwrap();
        assert_eq!(cfg.buffer_size, 8);
        assert_eq!(cfg.max_concurrent, 2);
        assert_eq!(cfg.tick_interval_ms, 50);
    }

    #[test]
    fn test_from_json_str_rejects_invalid_values() {
        let err = DispatcherConfig::from_json_str(
            r#"{"buffer_size": 0, "max_concurrent": 2, "tick_interval_ms": 50}"#,
        )
        .unwrap_err();
        assert_eq!(err, "buffer_size must be greater than 0");
    }

    #[test]
    fn test_from_json_str_reports_parse_errors() {
        let err = DispatcherConfig::from_json_str("not json").unwrap_err();
        assert!(err.starts_with("parse error:"));
    }

    #[test]
    fn test_json_round_trip() {
        let cfg = DispatcherConfig::new().with_buffer_size(16);
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed = DispatcherConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.buffer_size, 16);
        assert_eq!(parsed.max_concurrent, cfg.max_concurrent);
    }
}
