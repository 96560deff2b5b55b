//! FlowSplit - split incoming deposits across buckets
//!
//! A deposit is allocated across an ordered set of buckets (fixed amounts
//! first, then percentages of what remains) into a split plan. Executing the
//! plan drives one transfer per bucket through a [`gateway::TransferGateway`],
//! or hands the user a payment link for buckets that must be paid manually.
//!
//! # Architecture
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Deposits, buckets, split plans and money types
//! - `storage`: JSON file storage layer
//! - `services`: Allocation, plan lifecycle and the execution engine
//! - `gateway`: Transfer and notification gateways
//! - `audit`: Audit logging system
//!
//! # Example
//!
//! ```rust,ignore
//! use flowsplit::config::{paths::FlowSplitPaths, settings::Settings};
//!
//! let paths = FlowSplitPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::FlowSplitError;
