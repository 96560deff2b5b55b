//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod bucket;
pub mod deposit;
pub mod plan;

pub use bucket::{handle_bucket_command, BucketCommands};
pub use deposit::{handle_deposit_command, DepositCommands};
pub use plan::{build_engine, handle_plan_command, CliEngine, PlanCommands};
