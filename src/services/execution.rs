//! Split execution engine
//!
//! Drives an approved split plan's actions through the transfer gateway, one
//! at a time and in stored order. Each action is retried under a bounded
//! [`RetryPolicy`]; buckets with a payment link template become manual
//! actions without any transfer attempt.
//!
//! Transfer problems never surface as errors. They end up as `failed`
//! actions in the [`ExecutionResult`], and a later retry pass picks them up.
//! Every action outcome is committed through the [`PlanStore`] as soon as it
//! is known.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{FlowSplitError, FlowSplitResult};
use crate::gateway::{NotificationGateway, TransferGateway, TransferOutcome, TransferRequest};
use crate::models::{
    ActionStatus, Bucket, BucketId, Deposit, Money, SplitAction, SplitActionId, SplitPlan,
    SplitPlanId, SplitPlanStatus,
};

/// How the delay between transfer attempts grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `base_delay * attempt`
    #[default]
    Linear,
    /// `base_delay * 2^(attempt - 1)`
    Exponential,
}

/// Bounded retry policy for a single action within one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff: Backoff::Linear,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without waiting
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            backoff: Backoff::Linear,
        }
    }

    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt - 1)),
        }
    }
}

/// Outcome of executing one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResult {
    Completed { transaction_id: String },
    Failed { error: String },
    ManualRequired { external_link: String },
}

impl ActionResult {
    pub fn status(&self) -> ActionStatus {
        match self {
            Self::Completed { .. } => ActionStatus::Completed,
            Self::Failed { .. } => ActionStatus::Failed,
            Self::ManualRequired { .. } => ActionStatus::ManualRequired,
        }
    }
}

/// An action's outcome within a pass, with what it was for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub action_id: SplitActionId,
    pub bucket_id: BucketId,
    pub amount: Money,
    #[serde(flatten)]
    pub result: ActionResult,
}

/// What a pass means for the user, used to pick the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Every action transferred
    Completed { amount: Money, bucket_count: usize },
    /// Nothing failed but some money waits on the user
    ManualRequired { amount: Money },
    /// At least one action is still failed
    PartialFailure {
        completed_amount: Money,
        failed_amount: Money,
    },
}

/// Result of an execution or retry pass
///
/// Amounts describe the plan as it stands after the pass. `actions` lists
/// only the actions this pass touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub plan_id: SplitPlanId,
    pub status: SplitPlanStatus,
    pub total_amount: Money,
    pub completed_amount: Money,
    pub failed_amount: Money,
    pub manual_amount: Money,
    pub unallocated_amount: Money,
    pub outcome: ExecutionOutcome,
    pub actions: Vec<ActionReport>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExecutionResult {
    fn from_plan(plan: &SplitPlan, actions: Vec<ActionReport>) -> Self {
        let completed_amount = plan.executed_amount();
        let manual_amount = plan.manual_amount();
        let failed_amount: Money = plan
            .actions
            .iter()
            .filter(|a| !a.is_resolved())
            .map(|a| a.amount)
            .sum();
        let any_failed = plan.actions.iter().any(|a| !a.is_resolved());
        let any_manual = plan
            .actions
            .iter()
            .any(|a| a.status == ActionStatus::ManualRequired);

        let outcome = if any_failed {
            ExecutionOutcome::PartialFailure {
                completed_amount,
                failed_amount,
            }
        } else if any_manual {
            ExecutionOutcome::ManualRequired {
                amount: manual_amount,
            }
        } else {
            ExecutionOutcome::Completed {
                amount: plan.total_amount,
                bucket_count: plan.actions.len(),
            }
        };

        Self {
            plan_id: plan.id,
            status: plan.status,
            total_amount: plan.total_amount,
            completed_amount,
            failed_amount,
            manual_amount,
            unallocated_amount: plan.unallocated_amount,
            outcome,
            actions,
            completed_at: plan.completed_at,
        }
    }

    /// Amount transferred by this pass alone
    pub fn transferred_amount(&self) -> Money {
        self.actions
            .iter()
            .filter(|r| matches!(r.result, ActionResult::Completed { .. }))
            .map(|r| r.amount)
            .sum()
    }

    pub fn is_partial_failure(&self) -> bool {
        matches!(self.outcome, ExecutionOutcome::PartialFailure { .. })
    }
}

/// A plan loaded together with everything needed to execute it
#[derive(Debug, Clone)]
pub struct LoadedPlan {
    pub plan: SplitPlan,
    pub deposit: Deposit,
    /// Buckets referenced by the plan's actions, active or not
    pub buckets: HashMap<BucketId, Bucket>,
}

/// Persistence the engine needs
pub trait PlanStore: Send + Sync {
    fn load_plan(&self, plan_id: SplitPlanId) -> FlowSplitResult<LoadedPlan>;

    /// Persist the plan and its actions. Implementations check and bump
    /// `plan.version`.
    fn commit_plan(&self, plan: &mut SplitPlan) -> FlowSplitResult<()>;

    fn commit_deposit(&self, deposit: &Deposit) -> FlowSplitResult<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks a plan as having a pass in progress until dropped
struct PassGuard<'a> {
    in_flight: &'a Mutex<HashSet<SplitPlanId>>,
    plan_id: SplitPlanId,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.plan_id);
    }
}

/// Executes split plans against a transfer and a notification gateway
pub struct ExecutionEngine<T, N> {
    transfers: T,
    notifier: N,
    policy: RetryPolicy,
    notifications_enabled: bool,
    in_flight: Mutex<HashSet<SplitPlanId>>,
}

impl<T, N> ExecutionEngine<T, N>
where
    T: TransferGateway,
    N: NotificationGateway,
{
    pub fn new(transfers: T, notifier: N, policy: RetryPolicy) -> Self {
        Self {
            transfers,
            notifier,
            policy,
            notifications_enabled: true,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    pub fn transfers(&self) -> &T {
        &self.transfers
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a single action
    ///
    /// Manual buckets get one payment link and no transfer. Otherwise the
    /// transfer is attempted up to `max_attempts` times, sleeping between
    /// attempts but not after the last one.
    pub async fn execute_action(
        &self,
        action: &mut SplitAction,
        bucket: &Bucket,
        deposit: &Deposit,
    ) -> ActionResult {
        let request = TransferRequest {
            bucket_id: action.bucket_id,
            amount: action.amount,
            deposit_id: deposit.id,
        };

        if bucket.requires_manual_action() {
            let template = bucket.external_link.as_deref().unwrap_or_default();
            let link = self
                .transfers
                .generate_external_link(&request, template)
                .await;
            info!(action = %action.id, bucket = %bucket.name, amount = %action.amount, "manual action required");
            action.mark_manual(link.clone());
            return ActionResult::ManualRequired {
                external_link: link,
            };
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            action.begin_attempt();
            let failure = match self.transfers.execute_transfer(&request).await {
                Ok(TransferOutcome::Accepted { transaction_id }) => {
                    info!(
                        action = %action.id,
                        bucket = %bucket.name,
                        amount = %action.amount,
                        attempt,
                        transaction_id = %transaction_id,
                        "transfer completed"
                    );
                    action.mark_executed(transaction_id.clone());
                    return ActionResult::Completed { transaction_id };
                }
                Ok(TransferOutcome::Rejected { reason }) => reason,
                Err(e) => e.to_string(),
            };

            warn!(
                action = %action.id,
                bucket = %bucket.name,
                attempt,
                max_attempts,
                error = %failure,
                "transfer attempt failed"
            );
            last_error = failure;

            if attempt < max_attempts {
                tokio::time::sleep(self.policy.delay_for(attempt)).await;
            }
        }

        action.mark_failed(last_error.clone());
        ActionResult::Failed { error: last_error }
    }

    /// Execute every action of an approved plan
    ///
    /// Moves the plan to `executing` and the deposit to `processing`. If all
    /// actions resolve, both end up `completed`; otherwise they stay put
    /// until a retry pass finishes the job. Exactly one notification is sent.
    pub async fn execute_plan<S: PlanStore>(
        &self,
        store: &S,
        plan_id: SplitPlanId,
    ) -> FlowSplitResult<ExecutionResult> {
        let _guard = self.claim(plan_id)?;
        let loaded = store.load_plan(plan_id)?;

        if loaded.plan.status != SplitPlanStatus::Approved {
            return Err(FlowSplitError::plan_state(
                plan_id,
                loaded.plan.status,
                "executed",
            ));
        }

        self.run_plan(store, loaded).await
    }

    /// Approve a draft plan and execute it within the same pass
    ///
    /// The plan is claimed before the approval is committed, so a plan that
    /// already has a pass running is left untouched. Approved plans execute
    /// as with [`execute_plan`](Self::execute_plan).
    pub async fn approve_and_execute<S: PlanStore>(
        &self,
        store: &S,
        plan_id: SplitPlanId,
    ) -> FlowSplitResult<ExecutionResult> {
        let _guard = self.claim(plan_id)?;
        let mut loaded = store.load_plan(plan_id)?;

        match loaded.plan.status {
            SplitPlanStatus::Draft => {
                loaded
                    .plan
                    .approve()
                    .map_err(|e| FlowSplitError::plan_state(plan_id, e.from, "approved"))?;
                store.commit_plan(&mut loaded.plan)?;
                info!(plan = %plan_id, "split plan approved");
            }
            SplitPlanStatus::Approved => {}
            status => return Err(FlowSplitError::plan_state(plan_id, status, "executed")),
        }

        self.run_plan(store, loaded).await
    }

    async fn run_plan<S: PlanStore>(
        &self,
        store: &S,
        loaded: LoadedPlan,
    ) -> FlowSplitResult<ExecutionResult> {
        let LoadedPlan {
            mut plan,
            mut deposit,
            buckets,
        } = loaded;
        let plan_id = plan.id;

        plan.start_execution()
            .map_err(|e| FlowSplitError::plan_state(plan_id, e.from, "executed"))?;
        store.commit_plan(&mut plan)?;
        deposit.start_processing();
        store.commit_deposit(&deposit)?;

        info!(
            plan = %plan.id,
            deposit = %deposit.id,
            total = %plan.total_amount,
            actions = plan.actions.len(),
            "executing split plan"
        );

        let indices: Vec<usize> = (0..plan.actions.len()).collect();
        let reports = self
            .run_actions(store, &mut plan, &deposit, &buckets, &indices)
            .await?;
        let result = self.finish_pass(store, &mut plan, &mut deposit, reports)?;

        info!(
            plan = %result.plan_id,
            status = %result.status,
            completed = %result.completed_amount,
            failed = %result.failed_amount,
            manual = %result.manual_amount,
            "split plan pass finished"
        );

        self.notify(&deposit, &result).await;
        Ok(result)
    }

    /// Re-run every action that is neither executed nor manual
    ///
    /// Executed and manual actions are never touched. With nothing left to
    /// retry no gateway is called and no notification is sent.
    pub async fn retry_failed_actions<S: PlanStore>(
        &self,
        store: &S,
        plan_id: SplitPlanId,
    ) -> FlowSplitResult<ExecutionResult> {
        let _guard = self.claim(plan_id)?;
        let LoadedPlan {
            mut plan,
            mut deposit,
            buckets,
        } = store.load_plan(plan_id)?;

        match plan.status {
            SplitPlanStatus::Executing => {}
            SplitPlanStatus::Completed => return Ok(ExecutionResult::from_plan(&plan, Vec::new())),
            status => return Err(FlowSplitError::plan_state(plan.id, status, "retried")),
        }

        let indices = plan.retryable_action_indices();
        if indices.is_empty() {
            debug!(plan = %plan.id, "no actions to retry");
            return self.finish_pass(store, &mut plan, &mut deposit, Vec::new());
        }

        info!(plan = %plan.id, actions = indices.len(), "retrying failed actions");

        let reports = self
            .run_actions(store, &mut plan, &deposit, &buckets, &indices)
            .await?;
        let result = self.finish_pass(store, &mut plan, &mut deposit, reports)?;

        info!(
            plan = %result.plan_id,
            status = %result.status,
            transferred = %result.transferred_amount(),
            failed = %result.failed_amount,
            "retry pass finished"
        );

        self.notify(&deposit, &result).await;
        Ok(result)
    }

    fn claim(&self, plan_id: SplitPlanId) -> FlowSplitResult<PassGuard<'_>> {
        if !lock(&self.in_flight).insert(plan_id) {
            return Err(FlowSplitError::Conflict(format!(
                "split plan {} already has an execution pass running",
                plan_id
            )));
        }
        Ok(PassGuard {
            in_flight: &self.in_flight,
            plan_id,
        })
    }

    async fn run_actions<S: PlanStore>(
        &self,
        store: &S,
        plan: &mut SplitPlan,
        deposit: &Deposit,
        buckets: &HashMap<BucketId, Bucket>,
        indices: &[usize],
    ) -> FlowSplitResult<Vec<ActionReport>> {
        let mut reports = Vec::with_capacity(indices.len());

        for &index in indices {
            let action = &mut plan.actions[index];
            let result = match buckets.get(&action.bucket_id) {
                Some(bucket) => self.execute_action(action, bucket, deposit).await,
                None => {
                    let error = format!("bucket {} no longer exists", action.bucket_id);
                    warn!(action = %action.id, "{}", error);
                    action.mark_failed(error.clone());
                    ActionResult::Failed { error }
                }
            };
            let report = ActionReport {
                action_id: action.id,
                bucket_id: action.bucket_id,
                amount: action.amount,
                result,
            };

            // The pass stops here; later actions stay pending for a retry
            if let Err(e) = store.commit_plan(plan) {
                error!(
                    plan = %plan.id,
                    action = %report.action_id,
                    outcome = ?report.result,
                    error = %e,
                    "failed to record action outcome"
                );
                return Err(e);
            }
            reports.push(report);
        }

        Ok(reports)
    }

    fn finish_pass<S: PlanStore>(
        &self,
        store: &S,
        plan: &mut SplitPlan,
        deposit: &mut Deposit,
        reports: Vec<ActionReport>,
    ) -> FlowSplitResult<ExecutionResult> {
        if plan.status == SplitPlanStatus::Executing && plan.all_resolved() {
            let plan_id = plan.id;
            plan.complete()
                .map_err(|e| FlowSplitError::plan_state(plan_id, e.from, "completed"))?;
            store.commit_plan(plan)?;
            deposit.complete();
            store.commit_deposit(deposit)?;
        }
        Ok(ExecutionResult::from_plan(plan, reports))
    }

    async fn notify(&self, deposit: &Deposit, result: &ExecutionResult) {
        if !self.notifications_enabled {
            debug!(plan = %result.plan_id, "notifications disabled");
            return;
        }
        let Some(contact) = deposit.contact.as_deref() else {
            debug!(plan = %result.plan_id, "deposit has no contact, skipping notification");
            return;
        };

        let sent = match result.outcome {
            ExecutionOutcome::Completed {
                amount,
                bucket_count,
            } => {
                self.notifier
                    .notify_completed(contact, amount, bucket_count)
                    .await
            }
            ExecutionOutcome::ManualRequired { amount } => {
                self.notifier
                    .notify_manual_action_required(contact, amount)
                    .await
            }
            ExecutionOutcome::PartialFailure {
                completed_amount,
                failed_amount,
            } => {
                self.notifier
                    .notify_partial_failure(contact, completed_amount, failed_amount)
                    .await
            }
        };

        if let Err(e) = sent {
            error!(plan = %result.plan_id, error = %e, "failed to send notification");
        }
    }
}
