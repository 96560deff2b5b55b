//! Core data models for FlowSplit
//!
//! This module contains the data structures of the split domain: deposits,
//! buckets, split plans and their actions, plus the money types they share.

pub mod bucket;
pub mod deposit;
pub mod ids;
pub mod money;
pub mod percentage;
pub mod split_plan;

pub use bucket::{AllocationRule, Bucket};
pub use deposit::{Deposit, DepositStatus};
pub use ids::{BucketId, DepositId, SplitActionId, SplitPlanId};
pub use money::Money;
pub use percentage::Percentage;
pub use split_plan::{
    ActionStatus, PlanTransitionError, PlanValidationError, SplitAction, SplitPlan,
    SplitPlanStatus,
};
