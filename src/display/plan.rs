//! Split plan display formatting
//!
//! Previews, plan details and execution results. Actions refer to buckets by
//! ID, so callers pass the bucket list used to resolve names; a bucket that
//! no longer exists shows as its ID.

use crate::models::{ActionStatus, Bucket, BucketId, SplitPlan};
use crate::services::execution::{ActionResult, ExecutionOutcome, ExecutionResult};
use crate::services::split_plan::SplitPreview;

fn bucket_name(buckets: &[Bucket], id: BucketId) -> String {
    buckets
        .iter()
        .find(|b| b.id == id)
        .map(|b| b.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(str::len).max().unwrap_or(6).max(6)
}

/// Format an allocation preview
pub fn format_preview(preview: &SplitPreview) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Split preview for {} ({})\n\n",
        preview.deposit.id, preview.deposit.amount
    ));

    if preview.lines.is_empty() {
        output.push_str("No bucket receives any part of this deposit.\n");
    }

    let width = name_width(preview.lines.iter().map(|l| l.bucket.name.as_str()));
    for line in &preview.lines {
        let marker = if line.bucket.requires_manual_action() {
            "  (manual)"
        } else {
            ""
        };
        output.push_str(&format!(
            "  {:<width$}  {:>16}  {:>12}{}\n",
            line.bucket.name,
            line.bucket.rule.to_string(),
            line.amount.to_string(),
            marker,
            width = width,
        ));
    }

    output.push('\n');
    output.push_str(&format!("  Allocated:   {}\n", preview.allocated_amount()));
    output.push_str(&format!("  Unallocated: {}\n", preview.unallocated_amount));
    output
}

/// Format plans as a table, newest first
pub fn format_plan_list(plans: &[SplitPlan]) -> String {
    if plans.is_empty() {
        return "No split plans found.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<13}  {:<12}  {:>12}  {:>12}  {:>7}  {}\n",
        "ID", "Deposit", "Total", "Executed", "Actions", "Status"
    ));
    output.push_str(&format!(
        "{:-<13}  {:-<12}  {:->12}  {:->12}  {:->7}  {:-<10}\n",
        "", "", "", "", "", ""
    ));

    for plan in plans {
        output.push_str(&format!(
            "{:<13}  {:<12}  {:>12}  {:>12}  {:>7}  {}\n",
            plan.id.to_string(),
            plan.deposit_id.to_string(),
            plan.total_amount.to_string(),
            plan.executed_amount().to_string(),
            plan.actions.len(),
            plan.status,
        ));
    }

    output
}

/// Format a plan with every action
pub fn format_plan_details(plan: &SplitPlan, buckets: &[Bucket]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Split plan: {}\n", plan.id));
    output.push_str(&format!("  Deposit:     {}\n", plan.deposit_id));
    output.push_str(&format!("  Status:      {}\n", plan.status));
    output.push_str(&format!("  Total:       {}\n", plan.total_amount));
    output.push_str(&format!("  Allocated:   {}\n", plan.allocated_amount()));
    output.push_str(&format!("  Unallocated: {}\n", plan.unallocated_amount));
    output.push_str(&format!("  Executed:    {}\n", plan.executed_amount()));
    output.push('\n');

    let names: Vec<String> = plan
        .actions
        .iter()
        .map(|a| bucket_name(buckets, a.bucket_id))
        .collect();
    let width = name_width(names.iter().map(String::as_str));

    for (action, name) in plan.actions.iter().zip(&names) {
        let detail = match action.status {
            ActionStatus::Completed => action.transaction_id.clone().unwrap_or_default(),
            ActionStatus::Failed => action.error.clone().unwrap_or_default(),
            ActionStatus::ManualRequired => action.external_link.clone().unwrap_or_default(),
            ActionStatus::Pending | ActionStatus::Processing => String::new(),
        };
        output.push_str(&format!(
            "  {:<width$}  {:>12}  {:<15}  {}\n",
            name,
            action.amount.to_string(),
            action.status.to_string(),
            detail,
            width = width,
        ));
    }

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        plan.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if let Some(approved) = plan.approved_at {
        output.push_str(&format!(
            "  Approved: {}\n",
            approved.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    if let Some(completed) = plan.completed_at {
        output.push_str(&format!(
            "  Finished: {}\n",
            completed.format("%Y-%m-%d %H:%M UTC")
        ));
    }

    output
}

/// Format the outcome of an execution or retry pass
pub fn format_execution_result(result: &ExecutionResult, buckets: &[Bucket]) -> String {
    let mut output = String::new();

    let headline = match result.outcome {
        ExecutionOutcome::Completed { amount, bucket_count } => {
            format!("Split complete: {} across {} buckets", amount, bucket_count)
        }
        ExecutionOutcome::ManualRequired { amount } => {
            format!("Split done, {} waits on manual transfers", amount)
        }
        ExecutionOutcome::PartialFailure {
            completed_amount,
            failed_amount,
        } => format!(
            "Split partially failed: {} transferred, {} failed",
            completed_amount, failed_amount
        ),
    };
    output.push_str(&headline);
    output.push('\n');

    if result.actions.is_empty() {
        output.push_str("  Nothing to retry.\n");
    }

    let names: Vec<String> = result
        .actions
        .iter()
        .map(|r| bucket_name(buckets, r.bucket_id))
        .collect();
    let width = name_width(names.iter().map(String::as_str));

    for (report, name) in result.actions.iter().zip(&names) {
        let detail = match &report.result {
            ActionResult::Completed { transaction_id } => format!("ok      {}", transaction_id),
            ActionResult::Failed { error } => format!("FAILED  {}", error),
            ActionResult::ManualRequired { external_link } => {
                format!("manual  {}", external_link)
            }
        };
        output.push_str(&format!(
            "  {:<width$}  {:>12}  {}\n",
            name,
            report.amount.to_string(),
            detail,
            width = width,
        ));
    }

    output.push('\n');
    output.push_str(&format!("  Plan status: {}\n", result.status));
    if result.is_partial_failure() {
        output.push_str(&format!(
            "  Run 'flowsplit plan retry {}' to retry failed transfers.\n",
            result.plan_id
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Deposit, Money, Percentage, SplitAction};
    use crate::services::split_plan::PreviewLine;

    #[test]
    fn test_format_preview() {
        let tithe = Bucket::percentage("Tithe", Percentage::from_points(10))
            .with_external_link("https://give.example.com/?amt={amount}");
        let preview = SplitPreview {
            deposit: Deposit::new(Money::from_dollars(1000)),
            lines: vec![PreviewLine {
                bucket: tithe,
                amount: Money::from_dollars(100),
            }],
            unallocated_amount: Money::from_dollars(900),
        };

        let output = format_preview(&preview);
        assert!(output.contains("Tithe"));
        assert!(output.contains("(manual)"));
        assert!(output.contains("Unallocated: $900.00"));
    }

    #[test]
    fn test_plan_details_with_missing_bucket() {
        let savings = Bucket::percentage("Savings", Percentage::from_points(15));
        let gone = BucketId::new();
        let mut plan = SplitPlan::new(
            crate::models::DepositId::new(),
            Money::from_dollars(100),
            Money::from_dollars(75),
            vec![
                SplitAction::new(savings.id, Money::from_dollars(15)),
                SplitAction::new(gone, Money::from_dollars(10)),
            ],
        );
        plan.actions[1].mark_failed("bucket no longer exists");

        let output = format_plan_details(&plan, &[savings]);
        assert!(output.contains("Savings"));
        assert!(output.contains(&gone.to_string()));
        assert!(output.contains("bucket no longer exists"));
    }

    #[test]
    fn test_format_empty_plan_list() {
        assert!(format_plan_list(&[]).contains("No split plans found"));
    }
}
