//! Split plan and split action models
//!
//! A [`SplitPlan`] is the allocation of one deposit across buckets. Each line
//! item is a [`SplitAction`]. Both carry their own state machine:
//!
//! ```text
//! plan:   draft -> approved -> executing -> completed
//!           \________\____________\-----> cancelled
//!
//! action: pending -> processing -> completed | failed | manual_required
//!                        ^                       |
//!                        +---------(retry)-------+
//! ```
//!
//! `completed` and `manual_required` actions are resolved. `failed` actions
//! stay retryable indefinitely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BucketId, DepositId, SplitActionId, SplitPlanId};
use super::money::{Money, ONE_CENT};

/// Lifecycle status of a split plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitPlanStatus {
    #[default]
    Draft,
    Approved,
    /// Running, or stopped with at least one failed action awaiting retry
    Executing,
    Completed,
    Cancelled,
}

impl SplitPlanStatus {
    /// Completed and cancelled plans accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for SplitPlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Approved => write!(f, "approved"),
            Self::Executing => write!(f, "executing"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Execution status of a single split action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    ManualRequired,
}

impl ActionStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Completed | Self::ManualRequired)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::ManualRequired => write!(f, "manual_required"),
        }
    }
}

/// One bucket's line item within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitAction {
    pub id: SplitActionId,

    pub bucket_id: BucketId,

    pub amount: Money,

    #[serde(default)]
    pub status: ActionStatus,

    /// Set only when the transfer went through
    #[serde(default)]
    pub executed: bool,

    pub executed_at: Option<DateTime<Utc>>,

    /// Gateway reference for a completed transfer
    #[serde(default)]
    pub transaction_id: Option<String>,

    /// Last error seen while transferring
    #[serde(default)]
    pub error: Option<String>,

    /// Payment link for manual actions
    #[serde(default)]
    pub external_link: Option<String>,

    /// Transfer attempts made across all passes
    #[serde(default)]
    pub attempts: u32,
}

impl SplitAction {
    pub fn new(bucket_id: BucketId, amount: Money) -> Self {
        Self {
            id: SplitActionId::new(),
            bucket_id,
            amount,
            status: ActionStatus::Pending,
            executed: false,
            executed_at: None,
            transaction_id: None,
            error: None,
            external_link: None,
            attempts: 0,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.executed || self.status.is_resolved()
    }

    /// Whether a retry pass should pick this action up
    pub fn needs_retry(&self) -> bool {
        !self.is_resolved()
    }

    /// Record the start of a transfer attempt
    pub fn begin_attempt(&mut self) {
        self.status = ActionStatus::Processing;
        self.attempts += 1;
    }

    /// Record a successful transfer
    pub fn mark_executed(&mut self, transaction_id: impl Into<String>) {
        self.status = ActionStatus::Completed;
        self.executed = true;
        self.executed_at = Some(Utc::now());
        self.transaction_id = Some(transaction_id.into());
        self.error = None;
    }

    /// Record that all attempts failed; the action stays retryable
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = ActionStatus::Failed;
        self.error = Some(error.into());
    }

    /// Record that the user must complete this transfer via a link
    pub fn mark_manual(&mut self, link: impl Into<String>) {
        self.status = ActionStatus::ManualRequired;
        self.external_link = Some(link.into());
        self.error = None;
    }
}

/// The allocation of one deposit across buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPlan {
    pub id: SplitPlanId,

    /// At most one plan exists per deposit
    pub deposit_id: DepositId,

    /// Equals the deposit amount
    pub total_amount: Money,

    /// Part of the total no bucket claimed
    #[serde(default)]
    pub unallocated_amount: Money,

    #[serde(default)]
    pub status: SplitPlanStatus,

    /// Line items in execution order
    pub actions: Vec<SplitAction>,

    /// Optimistic concurrency token, bumped on every persisted write
    #[serde(default)]
    pub version: u64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub approved_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,
}

impl SplitPlan {
    /// Create a new draft plan
    pub fn new(
        deposit_id: DepositId,
        total_amount: Money,
        unallocated_amount: Money,
        actions: Vec<SplitAction>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SplitPlanId::new(),
            deposit_id,
            total_amount,
            unallocated_amount,
            status: SplitPlanStatus::Draft,
            actions,
            version: 0,
            created_at: now,
            updated_at: now,
            approved_at: None,
            completed_at: None,
        }
    }

    /// Sum of all action amounts
    pub fn allocated_amount(&self) -> Money {
        self.actions.iter().map(|a| a.amount).sum()
    }

    /// Sum of executed action amounts
    pub fn executed_amount(&self) -> Money {
        self.actions
            .iter()
            .filter(|a| a.executed)
            .map(|a| a.amount)
            .sum()
    }

    /// Sum of manual action amounts
    pub fn manual_amount(&self) -> Money {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::ManualRequired)
            .map(|a| a.amount)
            .sum()
    }

    /// True when every action is completed or manual_required
    pub fn all_resolved(&self) -> bool {
        self.actions.iter().all(SplitAction::is_resolved)
    }

    /// Indices of actions a retry pass should execute
    pub fn retryable_action_indices(&self) -> Vec<usize> {
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.needs_retry())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn approve(&mut self) -> Result<(), PlanTransitionError> {
        self.transition(SplitPlanStatus::Approved, &[SplitPlanStatus::Draft])?;
        self.approved_at = Some(self.updated_at);
        Ok(())
    }

    pub fn start_execution(&mut self) -> Result<(), PlanTransitionError> {
        self.transition(
            SplitPlanStatus::Executing,
            &[SplitPlanStatus::Approved, SplitPlanStatus::Executing],
        )
    }

    pub fn complete(&mut self) -> Result<(), PlanTransitionError> {
        self.transition(SplitPlanStatus::Completed, &[SplitPlanStatus::Executing])?;
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), PlanTransitionError> {
        self.transition(
            SplitPlanStatus::Cancelled,
            &[
                SplitPlanStatus::Draft,
                SplitPlanStatus::Approved,
                SplitPlanStatus::Executing,
            ],
        )
    }

    fn transition(
        &mut self,
        to: SplitPlanStatus,
        allowed_from: &[SplitPlanStatus],
    ) -> Result<(), PlanTransitionError> {
        if !allowed_from.contains(&self.status) {
            return Err(PlanTransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Validate the plan's totals
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        if !self.total_amount.is_positive() {
            return Err(PlanValidationError::NonPositiveTotal(self.total_amount));
        }

        if let Some(action) = self.actions.iter().find(|a| !a.amount.is_positive()) {
            return Err(PlanValidationError::NonPositiveAction {
                bucket_id: action.bucket_id,
                amount: action.amount,
            });
        }

        if self.unallocated_amount.is_negative() {
            return Err(PlanValidationError::NegativeUnallocated(
                self.unallocated_amount,
            ));
        }

        let accounted = self.allocated_amount() + self.unallocated_amount;
        if (self.total_amount - accounted).abs() > ONE_CENT {
            return Err(PlanValidationError::TotalMismatch {
                total: self.total_amount,
                accounted,
            });
        }

        Ok(())
    }
}

/// A plan status change that the state machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move split plan from {from} to {to}")]
pub struct PlanTransitionError {
    pub from: SplitPlanStatus,
    pub to: SplitPlanStatus,
}

/// Validation errors for split plans
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanValidationError {
    #[error("Plan total must be positive, got {0}")]
    NonPositiveTotal(Money),
    #[error("Action for bucket {bucket_id} has non-positive amount {amount}")]
    NonPositiveAction { bucket_id: BucketId, amount: Money },
    #[error("Unallocated amount cannot be negative, got {0}")]
    NegativeUnallocated(Money),
    #[error("Plan total {total} does not match allocated + unallocated {accounted}")]
    TotalMismatch { total: Money, accounted: Money },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with(amounts: &[i64], unallocated: i64) -> SplitPlan {
        let actions: Vec<_> = amounts
            .iter()
            .map(|&c| SplitAction::new(BucketId::new(), Money::from_cents(c)))
            .collect();
        let total = Money::from_cents(amounts.iter().sum::<i64>() + unallocated);
        SplitPlan::new(DepositId::new(), total, Money::from_cents(unallocated), actions)
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut plan = plan_with(&[1000, 2000], 0);
        assert_eq!(plan.status, SplitPlanStatus::Draft);

        plan.approve().unwrap();
        assert!(plan.approved_at.is_some());

        plan.start_execution().unwrap();
        plan.complete().unwrap();
        assert_eq!(plan.status, SplitPlanStatus::Completed);
        assert!(plan.completed_at.is_some());
        assert!(plan.status.is_terminal());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut plan = plan_with(&[1000], 0);

        assert_eq!(
            plan.start_execution(),
            Err(PlanTransitionError {
                from: SplitPlanStatus::Draft,
                to: SplitPlanStatus::Executing
            })
        );
        assert!(plan.complete().is_err());

        plan.approve().unwrap();
        assert!(plan.approve().is_err());

        plan.cancel().unwrap();
        assert!(plan.cancel().is_err());
        assert!(plan.start_execution().is_err());
    }

    #[test]
    fn test_executing_can_reenter_and_cancel() {
        let mut plan = plan_with(&[1000], 0);
        plan.approve().unwrap();
        plan.start_execution().unwrap();
        plan.start_execution().unwrap();
        plan.cancel().unwrap();
        assert_eq!(plan.status, SplitPlanStatus::Cancelled);
    }

    #[test]
    fn test_action_lifecycle() {
        let mut action = SplitAction::new(BucketId::new(), Money::from_dollars(50));
        assert!(action.needs_retry());

        action.begin_attempt();
        action.mark_failed("bank unavailable");
        assert_eq!(action.status, ActionStatus::Failed);
        assert!(!action.executed);
        assert!(action.needs_retry());

        action.begin_attempt();
        action.mark_executed("txn_abc");
        assert!(action.executed);
        assert!(action.is_resolved());
        assert_eq!(action.attempts, 2);
        assert!(action.error.is_none());
    }

    #[test]
    fn test_manual_action_is_resolved_but_not_executed() {
        let mut action = SplitAction::new(BucketId::new(), Money::from_dollars(50));
        action.mark_manual("https://pushpay.com/g/church?a=50.00");
        assert!(!action.executed);
        assert!(action.is_resolved());
        assert!(!action.needs_retry());
    }

    #[test]
    fn test_amount_rollups() {
        let mut plan = plan_with(&[1000, 2000, 3000], 0);
        plan.actions[0].mark_executed("txn_1");
        plan.actions[2].mark_manual("https://example.com");

        assert_eq!(plan.executed_amount(), Money::from_cents(1000));
        assert_eq!(plan.manual_amount(), Money::from_cents(3000));
        assert!(!plan.all_resolved());
        assert_eq!(plan.retryable_action_indices(), vec![1]);
    }

    #[test]
    fn test_validation_allows_one_cent_slack() {
        let mut plan = plan_with(&[1000, 2000], 500);
        assert!(plan.validate().is_ok());

        plan.total_amount += ONE_CENT;
        assert!(plan.validate().is_ok());

        plan.total_amount += ONE_CENT;
        assert!(matches!(
            plan.validate(),
            Err(PlanValidationError::TotalMismatch { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_zero_actions() {
        let plan = plan_with(&[1000, 0], 0);
        assert!(matches!(
            plan.validate(),
            Err(PlanValidationError::NonPositiveAction { .. })
        ));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ActionStatus::ManualRequired).unwrap(),
            "\"manual_required\""
        );
        assert_eq!(
            serde_json::to_string(&SplitPlanStatus::Executing).unwrap(),
            "\"executing\""
        );
    }
}
