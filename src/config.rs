// ABOUTME: Runtime configuration for the tracker: vault location and readiness timeout
// ABOUTME: Reads NUTRILOG_* environment variables with logged fallbacks to defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrilog Project

//! # Tracker Configuration
//!
//! Configuration is environment-first: [`TrackerConfig::from_env`] reads
//! the `NUTRILOG_*` variables and falls back to sensible defaults when
//! they are unset or malformed. Nothing here panics; bad values are
//! logged and replaced by the default so a misconfigured deployment
//! still starts.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding where the local vault stores its files.
pub const ENV_DATA_DIR: &str = "NUTRILOG_DATA_DIR";

/// Environment variable overriding the remote readiness timeout, in seconds.
pub const ENV_READY_TIMEOUT_SECS: &str = "NUTRILOG_READY_TIMEOUT_SECS";

/// Readiness timeout applied when no override is configured.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings for a [`FoodTracker`](crate::tracker::FoodTracker).
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Directory the local vault persists guest data in.
    pub data_dir: PathBuf,
    /// How long a remote connection may take to deliver its first
    /// snapshots before the tracker stops reporting itself as loading.
    pub ready_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

impl TrackerConfig {
    /// Build a configuration from `NUTRILOG_*` environment variables.
    ///
    /// Unset variables use defaults; malformed values are logged at
    /// `warn` and replaced by the default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var(ENV_DATA_DIR) {
            if dir.trim().is_empty() {
                warn!("{ENV_DATA_DIR} is set but empty, using default data directory");
            } else {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(raw) = env::var(ENV_READY_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) => config.ready_timeout = Duration::from_secs(secs),
                Err(_) => {
                    warn!(
                        value = %raw,
                        "{ENV_READY_TIMEOUT_SECS} is not a whole number of seconds, using default"
                    );
                }
            }
        }

        config
    }

    /// Replace the vault directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Replace the remote readiness timeout.
    #[must_use]
    pub const fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".nutrilog"), |dir| dir.join("nutrilog"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_overrides_apply() {
        env::set_var(ENV_DATA_DIR, "/tmp/nutrilog-test");
        env::set_var(ENV_READY_TIMEOUT_SECS, "3");

        let config = TrackerConfig::from_env();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/nutrilog-test"));
        assert_eq!(config.ready_timeout, Duration::from_secs(3));

        env::remove_var(ENV_DATA_DIR);
        env::remove_var(ENV_READY_TIMEOUT_SECS);
    }

    #[test]
    #[serial]
    fn malformed_timeout_falls_back_to_default() {
        env::set_var(ENV_READY_TIMEOUT_SECS, "soon");

        let config = TrackerConfig::from_env();
        assert_eq!(config.ready_timeout, DEFAULT_READY_TIMEOUT);

        env::remove_var(ENV_READY_TIMEOUT_SECS);
    }

    #[test]
    #[serial]
    fn unset_env_uses_defaults() {
        env::remove_var(ENV_DATA_DIR);
        env::remove_var(ENV_READY_TIMEOUT_SECS);

        let config = TrackerConfig::from_env();
        assert_eq!(config.ready_timeout, DEFAULT_READY_TIMEOUT);
        assert!(config.data_dir.ends_with("nutrilog") || config.data_dir.ends_with(".nutrilog"));
    }

    #[test]
    fn builder_helpers_replace_fields() {
        let config = TrackerConfig::default()
            .with_data_dir("/srv/nutrilog")
            .with_ready_timeout(Duration::from_millis(250));
        assert_eq!(config.data_dir, PathBuf::from("/srv/nutrilog"));
        assert_eq!(config.ready_timeout, Duration::from_millis(250));
    }
}
