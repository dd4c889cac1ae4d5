//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! debounce_ms = 500     # Quiet period before a burst of edits is reported
//! retry_ms = 1000       # Poll interval while the script root is missing
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::watch::{DEFAULT_DEBOUNCE, DEFAULT_RETRY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
    pub retry_ms: u64,
}

impl WatchConfig {
    pub const DEBOUNCE_MS: FieldPath = FieldPath::new("watch.debounce_ms");
    pub const RETRY_MS: FieldPath = FieldPath::new("watch.retry_ms");

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.debounce_ms == 0 {
            diag.error(Self::DEBOUNCE_MS, "must be greater than 0");
        }
        if self.retry_ms == 0 {
            diag.error(Self::RETRY_MS, "must be greater than 0");
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            retry_ms: DEFAULT_RETRY.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::test_parse_config;

    #[test]
    fn test_watch_config() {
        let config = test_parse_config("[watch]\ndebounce_ms = 200\nretry_ms = 50");
        assert_eq!(config.watch.debounce(), Duration::from_millis(200));
        assert_eq!(config.watch.retry(), Duration::from_millis(50));
    }

    #[test]
    fn test_watch_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.watch.debounce_ms, 500);
        assert_eq!(config.watch.retry_ms, 1000);
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let config = test_parse_config("[watch]\ndebounce_ms = 0\nretry_ms = 0");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("watch.debounce_ms"));
        assert!(err.contains("watch.retry_ms"));
    }
}
