//! Audit logging for FlowSplit
//!
//! Every create and update of a deposit, bucket or split plan is appended to
//! a JSONL audit log with before/after snapshots.
//!
//! - `AuditEntry`: one logged operation
//! - `AuditLogger`: appends entries to the log file and reads them back
//! - `generate_diff`: one-line summary of the top-level fields that changed

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
