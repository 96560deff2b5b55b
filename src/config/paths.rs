//! Path management for FlowSplit
//!
//! ## Path Resolution Order
//!
//! 1. `FLOWSPLIT_DATA_DIR` environment variable (if set)
//! 2. The platform config directory + `flowsplit`
//!    (`~/.config/flowsplit`, `%APPDATA%\flowsplit`, ...)

use std::path::PathBuf;

use crate::error::FlowSplitError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "FLOWSPLIT_DATA_DIR";

/// Manages all paths used by FlowSplit
#[derive(Debug, Clone)]
pub struct FlowSplitPaths {
    base_dir: PathBuf,
}

impl FlowSplitPaths {
    /// Resolve the base directory from the environment or platform defaults
    ///
    /// # Errors
    ///
    /// Returns an error if no home/config directory can be determined.
    pub fn new() -> Result<Self, FlowSplitError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create FlowSplitPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (<base>/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the notification outbox
    pub fn outbox_file(&self) -> PathBuf {
        self.base_dir.join("outbox.jsonl")
    }

    pub fn deposits_file(&self) -> PathBuf {
        self.data_dir().join("deposits.json")
    }

    pub fn buckets_file(&self) -> PathBuf {
        self.data_dir().join("buckets.json")
    }

    pub fn plans_file(&self) -> PathBuf {
        self.data_dir().join("plans.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), FlowSplitError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| FlowSplitError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| FlowSplitError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if FlowSplit has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, FlowSplitError> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("flowsplit"))
        .ok_or_else(|| FlowSplitError::Config("Could not determine a config directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FlowSplitPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(
            paths.plans_file(),
            temp_dir.path().join("data").join("plans.json")
        );
        assert_eq!(paths.outbox_file(), temp_dir.path().join("outbox.jsonl"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FlowSplitPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(!paths.is_initialized());
    }
}
