//! Display formatting for terminal output
//!
//! Formats buckets, deposits, plans and execution results as plain text
//! tables and detail views.

pub mod bucket;
pub mod deposit;
pub mod plan;

pub use bucket::{format_bucket_details, format_bucket_list};
pub use deposit::{format_deposit_details, format_deposit_list};
pub use plan::{format_execution_result, format_plan_details, format_plan_list, format_preview};
