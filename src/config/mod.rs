//! Configuration module for FlowSplit
//!
//! - Data directory resolution
//! - User settings persistence (retry policy, remainder policy, logging)

pub mod paths;
pub mod settings;

pub use paths::FlowSplitPaths;
pub use settings::{RetrySettings, Settings};
