//! Service layer for FlowSplit
//!
//! The service layer provides business logic on top of the storage layer:
//! allocation, validation, plan lifecycle checks and execution.

pub mod allocation;
pub mod bucket;
pub mod deposit;
pub mod execution;
pub mod split_plan;

pub use allocation::{allocate, Allocation, RemainderPolicy};
pub use bucket::{BucketService, CreateBucketInput};
pub use deposit::{DepositService, RecordDepositInput};
pub use execution::{
    ActionReport, ActionResult, Backoff, ExecutionEngine, ExecutionOutcome, ExecutionResult,
    LoadedPlan, PlanStore, RetryPolicy,
};
pub use split_plan::{PreviewLine, SplitPlanService, SplitPreview};
