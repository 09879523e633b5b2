//! Registry configuration

use std::time::Duration;

/// Default maximum box text length in bytes (1 MiB)
pub const DEFAULT_MAX_TEXT_LEN: usize = 1024 * 1024;

/// Default retention for boxes without updates (30 days)
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default interval between eviction sweeps (once a day)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the box registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum accepted text length in bytes (0 = unlimited)
    pub max_text_len: usize,

    /// How long a box survives without a text update
    pub retention: Duration,

    /// How often the eviction sweep runs
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            retention: DEFAULT_RETENTION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl RegistryConfig {
    /// Set the maximum text length (0 = unlimited)
    pub fn max_text_len(mut self, len: usize) -> Self {
        self.max_text_len = len;
        self
    }

    /// Set the retention window
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set the sweep interval
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Check a text length against the configured limit
    pub fn accepts_len(&self, len: usize) -> bool {
        self.max_text_len == 0 || len <= self.max_text_len
    }
}
