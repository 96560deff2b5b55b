//! Custom error types for FlowSplit
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.
//!
//! Transfer and notification problems are deliberately absent: they are
//! reported through execution results, never as errors.

use thiserror::Error;

/// The main error type for FlowSplit operations
#[derive(Error, Debug)]
pub enum FlowSplitError {
    /// Configuration-related errors (settings file, paths)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The operation is not valid for the plan's current status
    #[error("Split plan {plan} cannot be {operation} while {status}")]
    PlanState {
        plan: String,
        status: String,
        operation: &'static str,
    },

    /// Split configuration is missing or unusable (e.g. no active buckets)
    #[error("Split configuration error: {0}")]
    Configuration(String),

    /// A concurrent writer got there first
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FlowSplitError {
    /// Create a "not found" error for deposits
    pub fn deposit_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Deposit",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for buckets
    pub fn bucket_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Bucket",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for split plans
    pub fn plan_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Split plan",
            identifier: identifier.into(),
        }
    }

    /// Reject `operation` on a plan in its current status
    pub fn plan_state(
        plan: impl std::fmt::Display,
        status: impl std::fmt::Display,
        operation: &'static str,
    ) -> Self {
        Self::PlanState {
            plan: plan.to_string(),
            status: status.to_string(),
            operation,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a plan state error
    pub fn is_plan_state(&self) -> bool {
        matches!(self, Self::PlanState { .. })
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<std::io::Error> for FlowSplitError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FlowSplitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for FlowSplit operations
pub type FlowSplitResult<T> = Result<T, FlowSplitError>;
