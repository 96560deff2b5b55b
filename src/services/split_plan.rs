//! Split plan service
//!
//! The operations callers drive: preview, create, approve, execute, retry
//! and cancel. State checks happen here before anything is written.
//!
//! - create is idempotent: a deposit that already has a plan gets it back
//! - approve accepts only `draft` plans
//! - execute approves a `draft` plan first and accepts only `draft`/`approved`
//! - retry accepts only `executing` plans
//! - cancel accepts any non-terminal plan

use tracing::info;

use crate::audit::EntityType;
use crate::config::Settings;
use crate::error::{FlowSplitError, FlowSplitResult};
use crate::gateway::{NotificationGateway, TransferGateway};
use crate::models::{Bucket, Deposit, DepositId, Money, SplitAction, SplitPlan, SplitPlanId, SplitPlanStatus};
use crate::services::allocation::{allocate, Allocation};
use crate::services::execution::{ExecutionEngine, ExecutionResult, PlanStore};
use crate::storage::Storage;

/// One line of an allocation preview
#[derive(Debug, Clone)]
pub struct PreviewLine {
    pub bucket: Bucket,
    pub amount: Money,
}

/// What a deposit would be split into, without persisting anything
#[derive(Debug, Clone)]
pub struct SplitPreview {
    pub deposit: Deposit,
    pub lines: Vec<PreviewLine>,
    pub unallocated_amount: Money,
}

impl SplitPreview {
    pub fn allocated_amount(&self) -> Money {
        self.lines.iter().map(|l| l.amount).sum()
    }
}

/// Service for split plan operations
pub struct SplitPlanService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> SplitPlanService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    /// Allocate a deposit across the active buckets without saving a plan
    pub fn preview(&self, deposit_id: DepositId) -> FlowSplitResult<SplitPreview> {
        let deposit = self.load_deposit(deposit_id)?;
        let (buckets, allocation) = self.allocate_for(&deposit)?;

        let lines = allocation
            .amounts
            .iter()
            .filter_map(|(bucket_id, amount)| {
                buckets
                    .iter()
                    .find(|b| b.id == *bucket_id)
                    .map(|bucket| PreviewLine {
                        bucket: bucket.clone(),
                        amount: *amount,
                    })
            })
            .collect();

        Ok(SplitPreview {
            deposit,
            lines,
            unallocated_amount: allocation.unallocated,
        })
    }

    /// Create the draft plan for a deposit, or return the one it already has
    pub fn create(&self, deposit_id: DepositId) -> FlowSplitResult<SplitPlan> {
        if let Some(existing) = self.storage.plans.get_by_deposit(deposit_id)? {
            return Ok(existing);
        }

        let deposit = self.load_deposit(deposit_id)?;
        let (_, allocation) = self.allocate_for(&deposit)?;
        if allocation.is_empty() {
            return Err(FlowSplitError::Configuration(format!(
                "no active bucket receives any part of {}",
                deposit.amount
            )));
        }

        let actions = allocation
            .amounts
            .iter()
            .map(|(bucket_id, amount)| SplitAction::new(*bucket_id, *amount))
            .collect();
        let plan = SplitPlan::new(
            deposit.id,
            deposit.amount,
            allocation.unallocated,
            actions,
        );

        plan.validate()
            .map_err(|e| FlowSplitError::Validation(e.to_string()))?;

        self.storage.plans.create(&plan)?;

        self.storage.log_create(
            EntityType::SplitPlan,
            plan.id.to_string(),
            None,
            &plan,
        )?;

        info!(
            plan = %plan.id,
            deposit = %deposit.id,
            actions = plan.actions.len(),
            unallocated = %plan.unallocated_amount,
            "split plan created"
        );
        Ok(plan)
    }

    pub fn get(&self, id: SplitPlanId) -> FlowSplitResult<Option<SplitPlan>> {
        self.storage.plans.get(id)
    }

    pub fn get_by_deposit(&self, deposit_id: DepositId) -> FlowSplitResult<Option<SplitPlan>> {
        self.storage.plans.get_by_deposit(deposit_id)
    }

    /// Find a plan by its own ID or by its deposit's ID
    pub fn find(&self, identifier: &str) -> FlowSplitResult<Option<SplitPlan>> {
        if let Some(plan) = self.storage.plans.find(identifier)? {
            return Ok(Some(plan));
        }

        match self.storage.deposits.find(identifier)? {
            Some(deposit) => self.storage.plans.get_by_deposit(deposit.id),
            None => Ok(None),
        }
    }

    pub fn resolve(&self, identifier: &str) -> FlowSplitResult<SplitPlan> {
        self.find(identifier)?
            .ok_or_else(|| FlowSplitError::plan_not_found(identifier))
    }

    pub fn list(&self) -> FlowSplitResult<Vec<SplitPlan>> {
        self.storage.plans.get_all()
    }

    /// Approve a draft plan
    pub fn approve(&self, plan_id: SplitPlanId) -> FlowSplitResult<SplitPlan> {
        let mut plan = self.load_plan(plan_id)?;
        plan.approve()
            .map_err(|e| FlowSplitError::plan_state(plan_id, e.from, "approved"))?;
        self.storage.commit_plan(&mut plan)?;

        info!(plan = %plan.id, "split plan approved");
        Ok(plan)
    }

    /// Execute a plan, approving it first if it is still a draft
    pub async fn execute<T, N>(
        &self,
        engine: &ExecutionEngine<T, N>,
        plan_id: SplitPlanId,
    ) -> FlowSplitResult<ExecutionResult>
    where
        T: TransferGateway,
        N: NotificationGateway,
    {
        let plan = self.load_plan(plan_id)?;
        match plan.status {
            SplitPlanStatus::Draft | SplitPlanStatus::Approved => {}
            status => return Err(FlowSplitError::plan_state(plan_id, status, "executed")),
        }

        engine.approve_and_execute(self.storage, plan_id).await
    }

    /// Retry the failed actions of an executing plan
    pub async fn retry<T, N>(
        &self,
        engine: &ExecutionEngine<T, N>,
        plan_id: SplitPlanId,
    ) -> FlowSplitResult<ExecutionResult>
    where
        T: TransferGateway,
        N: NotificationGateway,
    {
        let plan = self.load_plan(plan_id)?;
        if plan.status != SplitPlanStatus::Executing {
            return Err(FlowSplitError::plan_state(plan_id, plan.status, "retried"));
        }

        engine.retry_failed_actions(self.storage, plan_id).await
    }

    /// Cancel a plan that has not finished
    ///
    /// Cancelling mid-execution marks the deposit failed; money already
    /// transferred stays where it went.
    pub fn cancel(&self, plan_id: SplitPlanId) -> FlowSplitResult<SplitPlan> {
        let mut plan = self.load_plan(plan_id)?;
        let was_executing = plan.status == SplitPlanStatus::Executing;

        plan.cancel()
            .map_err(|e| FlowSplitError::plan_state(plan_id, e.from, "cancelled"))?;
        self.storage.commit_plan(&mut plan)?;

        if was_executing {
            let mut deposit = self.load_deposit(plan.deposit_id)?;
            deposit.fail();
            self.storage.commit_deposit(&deposit)?;
        }

        info!(plan = %plan.id, executed = %plan.executed_amount(), "split plan cancelled");
        Ok(plan)
    }

    fn load_plan(&self, plan_id: SplitPlanId) -> FlowSplitResult<SplitPlan> {
        self.storage
            .plans
            .get(plan_id)?
            .ok_or_else(|| FlowSplitError::plan_not_found(plan_id.to_string()))
    }

    fn load_deposit(&self, deposit_id: DepositId) -> FlowSplitResult<Deposit> {
        self.storage
            .deposits
            .get(deposit_id)?
            .ok_or_else(|| FlowSplitError::deposit_not_found(deposit_id.to_string()))
    }

    fn allocate_for(&self, deposit: &Deposit) -> FlowSplitResult<(Vec<Bucket>, Allocation)> {
        deposit
            .validate()
            .map_err(|e| FlowSplitError::Validation(e.to_string()))?;

        let buckets = self.storage.buckets.get_active()?;
        if buckets.is_empty() {
            return Err(FlowSplitError::Configuration(
                "no active buckets configured".into(),
            ));
        }

        let allocation = allocate(deposit.amount, &buckets, self.settings.remainder_policy);
        Ok((buckets, allocation))
    }
}
