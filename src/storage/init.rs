//! Storage initialization
//!
//! First-run setup: directories plus empty data files.

use serde_json::json;

use crate::config::paths::FlowSplitPaths;
use crate::error::FlowSplitError;

use super::file_io::write_json_atomic;

/// Initialize storage for a fresh installation
///
/// Existing data files are left untouched.
pub fn initialize_storage(paths: &FlowSplitPaths) -> Result<(), FlowSplitError> {
    paths.ensure_directories()?;

    let files = [
        (paths.deposits_file(), json!({ "deposits": [] })),
        (paths.buckets_file(), json!({ "buckets": [] })),
        (paths.plans_file(), json!({ "plans": [] })),
    ];

    for (path, empty) in files {
        if !path.exists() {
            write_json_atomic(&path, &empty)?;
        }
    }

    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &FlowSplitPaths) -> bool {
    !paths.buckets_file().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_storage() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FlowSplitPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert!(needs_initialization(&paths));
        initialize_storage(&paths).unwrap();

        assert!(!needs_initialization(&paths));
        assert!(paths.deposits_file().exists());
        assert!(paths.plans_file().exists());
    }

    #[test]
    fn test_doesnt_overwrite_existing() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FlowSplitPaths::with_base_dir(temp_dir.path().to_path_buf());

        initialize_storage(&paths).unwrap();
        std::fs::write(paths.buckets_file(), r#"{"buckets": [], "marker": 1}"#).unwrap();

        initialize_storage(&paths).unwrap();

        let content = std::fs::read_to_string(paths.buckets_file()).unwrap();
        assert!(content.contains("marker"));
    }
}
