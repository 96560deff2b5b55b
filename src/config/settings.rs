//! User settings for FlowSplit
//!
//! Holds the retry policy for transfers, how unclaimed remainders are handled,
//! logging preferences and notification toggles.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::paths::FlowSplitPaths;
use crate::error::FlowSplitError;
use crate::services::allocation::RemainderPolicy;
use crate::services::execution::{Backoff, RetryPolicy};

/// Transfer retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts per action per pass (at least 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default)]
    pub backoff: Backoff,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff: Backoff::default(),
        }
    }
}

/// User settings for FlowSplit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub retry: RetrySettings,

    /// What happens to money that no bucket claims
    #[serde(default)]
    pub remainder_policy: RemainderPolicy,

    /// Default tracing filter (overridden by `FLOWSPLIT_LOG`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Base URL used when a manual payment link has no usable template
    #[serde(default = "default_link_base")]
    pub fallback_link_base: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_link_base() -> String {
    "https://flowsplit.app/pay".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            retry: RetrySettings::default(),
            remainder_policy: RemainderPolicy::default(),
            log_level: default_log_level(),
            log_json: false,
            notifications_enabled: true,
            fallback_link_base: default_link_base(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &FlowSplitPaths) -> Result<Self, FlowSplitError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| FlowSplitError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            FlowSplitError::Config(format!("Failed to parse settings file: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &FlowSplitPaths) -> Result<(), FlowSplitError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            FlowSplitError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| FlowSplitError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), FlowSplitError> {
        if self.retry.max_attempts == 0 {
            return Err(FlowSplitError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Build the engine's retry policy
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            backoff: self.retry.backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.base_delay_ms, 2000);
        assert_eq!(settings.remainder_policy, RemainderPolicy::Unallocated);
        assert!(settings.notifications_enabled);

        let policy = settings.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.backoff, Backoff::Linear);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FlowSplitPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.retry.max_attempts = 5;
        settings.remainder_policy = RemainderPolicy::FirstBucket;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.retry.max_attempts, 5);
        assert_eq!(loaded.remainder_policy, RemainderPolicy::FirstBucket);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FlowSplitPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"log_level":"debug"}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.retry.max_attempts, 3);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FlowSplitPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"retry":{"max_attempts":0}}"#).unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, FlowSplitError::Config(_)));
    }
}
